//! Integration tests for style substitution and composition

use mailsmith::template::BODY_PLACEHOLDER;
use mailsmith::{apply_style_tokens, compose_email, EditorState, StyleConfig, StylePatch, StyleToken};

#[test]
fn test_button_radius_change_reaches_every_occurrence() {
    let mut editor = EditorState::default();
    editor.set_body_html(
        r#"<td style="border-radius: {{STYLE_BUTTON_RADIUS}}"><a style="border-radius: {{STYLE_BUTTON_RADIUS}}">Go</a></td>"#,
    );
    assert_eq!(editor.composed_html().matches("border-radius: 8px").count(), 2);

    editor.update_style(&StylePatch::new().with(StyleToken::ButtonRadius, "0px"));
    let html = editor.composed_html();
    assert_eq!(html.matches("border-radius: 0px").count(), 2);
    assert!(!html.contains("{{STYLE_BUTTON_RADIUS}}"));
}

#[test]
fn test_text_without_tokens_unchanged() {
    let style = StyleConfig::default();
    for html in ["", "<p>plain</p>", "{{ .ConfirmationURL }}", "{{STYLE_"] {
        assert_eq!(apply_style_tokens(html, &style), html);
    }
}

#[test]
fn test_substitution_is_idempotent() {
    let style = StyleConfig::default();
    let html: String = StyleToken::ALL.iter().map(|t| t.token()).collect();
    let once = apply_style_tokens(&html, &style);
    assert_eq!(apply_style_tokens(&once, &style), once);
}

#[test]
fn test_every_default_template_resolves_fully() {
    let editor = EditorState::default();
    let style = editor.template_style();
    for template in editor.templates() {
        for variant in template.variants() {
            let html = editor.global_template().compose(&variant.body_html, Some(style));
            assert!(
                !html.contains("{{STYLE_"),
                "{}/{} left a style token",
                template.template_type(),
                variant.id
            );
            assert!(!html.contains(BODY_PLACEHOLDER));
        }
    }
}

#[test]
fn test_placeholder_position() {
    let global = format!("<header/>{}<footer/>", BODY_PLACEHOLDER);
    let out = compose_email(&global, "<main/>", None);
    insta::assert_snapshot!(out, @"<header/><main/><footer/>");
}

#[test]
fn test_missing_placeholder_appends_body() {
    let out = compose_email("<div>global</div>", "<p>body</p>", None);
    assert_eq!(out, "<div>global</div><p>body</p>");
}
