//! Built-in template types, variables and starter content
//!
//! All HTML here is written against style tokens so a brand change in the
//! style configuration reaches every template.

use super::catalog::{TemplateCategory, TemplateTypeInfo};
use super::composer::BODY_PLACEHOLDER;
use super::variables::TemplateVariable;
use super::variants::{EmailTemplate, TemplateVariant, DEFAULT_VARIANT_ID};

/// Type selected when nothing else is
pub const DEFAULT_TEMPLATE_TYPE: &str = "confirm-signup";

const ALL_AUTH_TYPES: [&str; 6] = [
    "confirm-signup",
    "invite-user",
    "magic-link",
    "change-email",
    "reset-password",
    "reauthentication",
];

const LINK_TYPES: [&str; 5] = [
    "confirm-signup",
    "invite-user",
    "magic-link",
    "change-email",
    "reset-password",
];

const GLOBAL_TEMPLATE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{{STYLE_BRAND_NAME}}</title>
</head>
<body style="margin: 0; padding: 0; background-color: {{STYLE_BG_COLOR}}; font-family: {{STYLE_FONT_FAMILY}};">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="background-color: {{STYLE_BG_COLOR}};">
    <tr>
      <td align="center" style="padding: 40px 20px;">
        <table role="presentation" width="600" cellspacing="0" cellpadding="0" style="background-color: {{STYLE_CONTAINER_BG}}; border-radius: {{STYLE_CONTAINER_RADIUS}}; overflow: hidden; box-shadow: 0 1px 3px rgba(0,0,0,0.08);">
          <!-- Header -->
          <tr>
            <td style="padding: 32px 40px 24px; border-bottom: 1px solid #e4e4e7;">
              <span style="font-size: 20px; font-weight: 700; color: {{STYLE_BRAND_COLOR}}; letter-spacing: -0.02em;">{{STYLE_BRAND_NAME}}</span>
            </td>
          </tr>
          <!-- Body -->
          <tr>
            <td style="padding: 40px;">
              "#;

const GLOBAL_TEMPLATE_TAIL: &str = r#"
            </td>
          </tr>
          <!-- Footer -->
          <tr>
            <td style="padding: 24px 40px 32px; border-top: 1px solid #e4e4e7;">
              <p style="margin: 0; font-size: 13px; line-height: 20px; color: {{STYLE_FOOTER_COLOR}}; text-align: center;">
                This email was sent by <a href="{{ .SiteURL }}" style="color: {{STYLE_FOOTER_LINK_COLOR}}; text-decoration: underline;">{{STYLE_BRAND_NAME}}</a>.
                If you didn't request this, you can safely ignore it.
              </p>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#;

/// The default global wrapper document
pub fn default_global_html() -> String {
    format!("{}{}{}", GLOBAL_TEMPLATE_HEAD, BODY_PLACEHOLDER, GLOBAL_TEMPLATE_TAIL)
}

fn heading(text: &str) -> String {
    format!(
        r#"<h1 style="margin: 0 0 8px; font-size: {{{{STYLE_HEADING_SIZE}}}}; font-weight: 700; color: {{{{STYLE_HEADING_COLOR}}}}; letter-spacing: -0.02em;">
                {}
              </h1>"#,
        text
    )
}

fn paragraph(text: &str) -> String {
    format!(
        r#"<p style="margin: 0 0 24px; font-size: {{{{STYLE_BODY_SIZE}}}}; line-height: 24px; color: {{{{STYLE_BODY_COLOR}}}};">
                {}
              </p>"#,
        text
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"<table role="presentation" cellspacing="0" cellpadding="0">
                <tr>
                  <td style="border-radius: {{{{STYLE_BUTTON_RADIUS}}}}; background-color: {{{{STYLE_BUTTON_BG}}}};">
                    <a href="{}" style="display: inline-block; padding: 12px 32px; font-size: 14px; font-weight: 600; color: {{{{STYLE_BUTTON_TEXT}}}}; text-decoration: none; border-radius: {{{{STYLE_BUTTON_RADIUS}}}};">
                      {}
                    </a>
                  </td>
                </tr>
              </table>"#,
        href, label
    )
}

fn footnote(text: &str) -> String {
    format!(
        r#"<p style="margin: 24px 0 0; font-size: 13px; line-height: 20px; color: {{{{STYLE_FOOTER_COLOR}}}};">
                {}
              </p>"#,
        text
    )
}

const OTP_NOTE: &str = r#"Or use this OTP code: <strong style="color: {{STYLE_HEADING_COLOR}}; font-family: monospace; font-size: 16px; letter-spacing: 0.1em;">{{ .Token }}</strong>"#;

fn body(parts: &[String]) -> String {
    parts.join("\n              ")
}

/// Starter body for a newly created custom type
pub fn custom_type_body(label: &str, description: &str) -> String {
    body(&[heading(label), paragraph(description)])
}

/// Template a newly created custom type starts with
pub fn custom_type_template(info: &TemplateTypeInfo) -> EmailTemplate {
    let variant = TemplateVariant::new(
        DEFAULT_VARIANT_ID,
        "Default",
        info.label.clone(),
        custom_type_body(&info.label, &info.description),
    );
    EmailTemplate::new(info.id.clone(), variant)
}

fn confirm_signup_body() -> String {
    body(&[
        heading("Confirm your email"),
        paragraph("Thanks for signing up! Please confirm your email address to get started."),
        button("{{ .ConfirmationURL }}", "Confirm Email Address"),
        footnote(OTP_NOTE),
    ])
}

fn confirm_signup_minimal_body() -> String {
    body(&[
        heading("Confirm your email"),
        paragraph("Click below to verify <strong>{{ .Email }}</strong>."),
        button("{{ .ConfirmationURL }}", "Verify Email"),
    ])
}

fn confirm_signup_branded_body() -> String {
    let inner = body(&[
        heading("Welcome to {{STYLE_BRAND_NAME}}!"),
        paragraph("We're excited to have you on board. Confirm your email to unlock all features."),
        button("{{ .ConfirmationURL }}", "Get Started"),
        footnote(r#"Your verification code: <strong style="color: {{STYLE_BRAND_COLOR}}; font-family: monospace; font-size: 15px;">{{ .Token }}</strong>"#),
    ]);
    format!("<div style=\"text-align: center;\">\n              {}\n              </div>", inner)
}

fn invite_user_body() -> String {
    body(&[
        heading("You've been invited"),
        paragraph("You've been invited to join <strong style=\"color: {{STYLE_HEADING_COLOR}};\">{{STYLE_BRAND_NAME}}</strong>. Click the button below to accept the invitation and set up your account."),
        button("{{ .ConfirmationURL }}", "Accept Invitation"),
        footnote("This invitation was sent to <strong>{{ .Email }}</strong>. If you weren't expecting this, you can ignore it."),
    ])
}

fn magic_link_body() -> String {
    body(&[
        heading("Your login link"),
        paragraph("Click the button below to log in to your account. This link will expire in 10 minutes."),
        button("{{ .ConfirmationURL }}", "Log In to {{STYLE_BRAND_NAME}}"),
        footnote(OTP_NOTE),
    ])
}

fn change_email_body() -> String {
    body(&[
        heading("Confirm email change"),
        paragraph("We received a request to change your email from <strong>{{ .Email }}</strong> to <strong>{{ .NewEmail }}</strong>. Please confirm this change by clicking the button below."),
        button("{{ .ConfirmationURL }}", "Confirm Email Change"),
        footnote("If you didn't request this change, please secure your account immediately."),
    ])
}

fn reset_password_body() -> String {
    body(&[
        heading("Reset your password"),
        paragraph("We received a request to reset the password for your account. Click the button below to choose a new password."),
        button("{{ .ConfirmationURL }}", "Reset Password"),
        footnote(OTP_NOTE),
    ])
}

fn reauthentication_body() -> String {
    body(&[
        heading("Verify your identity"),
        paragraph("Enter the following verification code to confirm your identity. This code will expire in 5 minutes."),
        r#"<table role="presentation" cellspacing="0" cellpadding="0" width="100%">
                <tr>
                  <td align="center" style="padding: 24px; background-color: {{STYLE_BG_COLOR}}; border-radius: {{STYLE_BUTTON_RADIUS}};">
                    <span style="font-size: 32px; font-weight: 700; font-family: monospace; color: {{STYLE_HEADING_COLOR}}; letter-spacing: 0.2em;">{{ .Token }}</span>
                  </td>
                </tr>
              </table>"#
            .to_string(),
        footnote("If you didn't request this code, someone may be trying to access your account. Please secure your account."),
    ])
}

fn auth_type(id: &str, label: &str, description: &str, icon: &str, variables: &[&str]) -> TemplateTypeInfo {
    TemplateTypeInfo {
        id: id.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        variables: variables.iter().map(|v| v.to_string()).collect(),
        category: TemplateCategory::SupabaseAuth,
        is_built_in: true,
    }
}

/// The built-in template types
pub fn builtin_template_types() -> Vec<TemplateTypeInfo> {
    let common = [
        "{{ .ConfirmationURL }}",
        "{{ .Token }}",
        "{{ .TokenHash }}",
        "{{ .SiteURL }}",
        "{{ .Email }}",
    ];
    let mut change_email = common.to_vec();
    change_email.push("{{ .NewEmail }}");

    vec![
        auth_type(
            "confirm-signup",
            "Confirm Sign Up",
            "Sent when a new user signs up to confirm their email address",
            "UserCheck",
            &common,
        ),
        auth_type(
            "invite-user",
            "Invite User",
            "Sent when an admin invites a new user to the platform",
            "UserPlus",
            &common,
        ),
        auth_type(
            "magic-link",
            "Magic Link",
            "Sent when a user requests a passwordless login link",
            "Sparkles",
            &common,
        ),
        auth_type(
            "change-email",
            "Change Email",
            "Sent when a user requests to change their email address",
            "MailWarning",
            &change_email,
        ),
        auth_type(
            "reset-password",
            "Reset Password",
            "Sent when a user requests a password reset",
            "KeyRound",
            &common,
        ),
        auth_type(
            "reauthentication",
            "Reauthentication",
            "Sent when a user needs to re-verify their identity for a sensitive action",
            "ShieldCheck",
            &common[1..],
        ),
    ]
}

fn variable(name: &str, description: &str, available_for: &[&str]) -> TemplateVariable {
    TemplateVariable::new(
        name,
        format!("{{{{ .{} }}}}", name),
        description,
        available_for.iter().map(|s| s.to_string()).collect(),
    )
}

/// The built-in variables
pub fn builtin_variables() -> Vec<TemplateVariable> {
    vec![
        variable("ConfirmationURL", "Full URL the user clicks to confirm the action", &LINK_TYPES),
        variable("Token", "6-digit OTP code for verification", &ALL_AUTH_TYPES),
        variable("TokenHash", "Hashed version of the token for secure URL construction", &ALL_AUTH_TYPES),
        variable("SiteURL", "Base URL of your application", &ALL_AUTH_TYPES),
        variable("Email", "The user's email address", &ALL_AUTH_TYPES),
        variable("NewEmail", "The new email address the user is changing to", &["change-email"]),
        variable("RedirectTo", "URL to redirect to after the action is completed", &LINK_TYPES),
    ]
}

fn default_variant(subject: &str, body_html: String) -> TemplateVariant {
    TemplateVariant::new(DEFAULT_VARIANT_ID, "Default", subject, body_html)
}

/// Starter templates for every built-in type
pub fn builtin_templates() -> Vec<EmailTemplate> {
    let confirm_signup = vec![
        default_variant("Confirm your email address", confirm_signup_body()),
        TemplateVariant::new("minimal", "Minimal", "Verify your email", confirm_signup_minimal_body()),
        TemplateVariant::new(
            "branded",
            "Branded",
            "Welcome to {{STYLE_BRAND_NAME}} - Confirm your email",
            confirm_signup_branded_body(),
        ),
    ];

    let mut templates = Vec::with_capacity(ALL_AUTH_TYPES.len());
    templates.extend(EmailTemplate::with_variants("confirm-signup", confirm_signup));
    templates.extend([
        EmailTemplate::new(
            "invite-user",
            default_variant("You've been invited to join {{STYLE_BRAND_NAME}}", invite_user_body()),
        ),
        EmailTemplate::new(
            "magic-link",
            default_variant("Your login link for {{STYLE_BRAND_NAME}}", magic_link_body()),
        ),
        EmailTemplate::new(
            "change-email",
            default_variant("Confirm your email change", change_email_body()),
        ),
        EmailTemplate::new(
            "reset-password",
            default_variant("Reset your password", reset_password_body()),
        ),
        EmailTemplate::new(
            "reauthentication",
            default_variant("Your verification code", reauthentication_body()),
        ),
    ]);
    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_builtin_type_has_a_template() {
        let types = builtin_template_types();
        let templates = builtin_templates();
        assert_eq!(types.len(), templates.len());
        for (info, template) in types.iter().zip(&templates) {
            assert_eq!(info.id, template.template_type());
            assert!(info.is_built_in);
            assert!(!template.variants().is_empty());
        }
    }

    #[test]
    fn test_builtin_ids_unique() {
        let ids: HashSet<String> = builtin_template_types().into_iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 6);
        assert!(ids.contains(DEFAULT_TEMPLATE_TYPE));
    }

    #[test]
    fn test_variables_reference_known_types() {
        let ids: HashSet<String> = builtin_template_types().into_iter().map(|t| t.id).collect();
        for var in builtin_variables() {
            assert!(var.syntax.starts_with("{{ ."), "{}", var.syntax);
            for id in &var.available_for {
                assert!(ids.contains(id), "{} -> {}", var.name, id);
            }
        }
    }

    #[test]
    fn test_global_html_has_single_placeholder() {
        assert_eq!(default_global_html().matches(BODY_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn test_helpers_emit_style_tokens() {
        assert!(heading("Hi").contains("{{STYLE_HEADING_SIZE}}"));
        assert!(button("#", "Go").contains("{{STYLE_BUTTON_RADIUS}}"));
    }
}
