//! Account emails: confirmation and password reset.

use reqwest::Url;

use crate::error::{AppError, AppResult};
use crate::services::notifications::EmailMessage;

pub const CONFIRM_EMAIL_PATH: &str = "/api/auth/confirm-email";
pub const RESET_PASSWORD_PATH: &str = "/api/auth/reset-password";

/// `{base}{path}?email=..&token=..` with both parameters URL-encoded.
pub fn action_link(base_url: &str, path: &str, email: &str, token: &str) -> AppResult<Url> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    let mut url = Url::parse(&raw).map_err(|e| AppError::Configuration {
        key: "email.public_base_url".to_string(),
        source: anyhow::anyhow!("cannot build link from '{}': {}", raw, e),
    })?;
    url.query_pairs_mut()
        .append_pair("email", email)
        .append_pair("token", token);
    Ok(url)
}

pub fn confirmation_email(base_url: &str, to: &str, token: &str) -> AppResult<EmailMessage> {
    let link = action_link(base_url, CONFIRM_EMAIL_PATH, to, token)?;
    Ok(EmailMessage {
        to: to.to_string(),
        subject: "Confirm your account".to_string(),
        html_body: format!(
            "<p>Please confirm your email address by following this link: \
             <a href=\"{}\">Confirm account</a></p>\
             <p>The link expires in 24 hours.</p>",
            link
        ),
    })
}

pub fn password_reset_email(base_url: &str, to: &str, token: &str) -> AppResult<EmailMessage> {
    let link = action_link(base_url, RESET_PASSWORD_PATH, to, token)?;
    Ok(EmailMessage {
        to: to.to_string(),
        subject: "Password reset".to_string(),
        html_body: format!(
            "<p>To choose a new password follow this link: \
             <a href=\"{}\">Reset password</a></p>\
             <p>The link expires in 1 hour. If you did not ask for a reset, ignore this email.</p>",
            link
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_encodes_query_parameters() {
        let url = action_link(
            "https://accounts.example.com/",
            CONFIRM_EMAIL_PATH,
            "ann+test@example.com",
            "abc123",
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://accounts.example.com/api/auth/confirm-email?email=ann%2Btest%40example.com&token=abc123"
        );
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("email".to_string(), "ann+test@example.com".to_string()));
    }

    #[test]
    fn test_link_keeps_base_path_prefix() {
        let url =
            action_link("http://host:8080/accounts", RESET_PASSWORD_PATH, "a@b.c", "t").unwrap();
        assert_eq!(url.path(), "/accounts/api/auth/reset-password");
    }

    #[test]
    fn test_reset_email_contains_link() {
        let message = password_reset_email("http://localhost:3000", "a@b.c", "deadbeef").unwrap();
        assert_eq!(message.to, "a@b.c");
        assert!(
            message
                .html_body
                .contains("http://localhost:3000/api/auth/reset-password?email=a%40b.c&token=deadbeef")
        );
    }

    #[test]
    fn test_bad_base_url_is_configuration_error() {
        assert!(matches!(
            confirmation_email("not a url", "a@b.c", "t"),
            Err(AppError::Configuration { .. })
        ));
    }
}
