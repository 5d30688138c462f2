//! Template engine based on MiniJinja

use minijinja::Environment;
use tracing::debug;

use crate::error::TemplateError;
use crate::transforms;

/// Name under which the document source is registered per call
const DOCUMENT_TEMPLATE: &str = "document";

/// Check whether text contains template syntax.
///
/// This is a pure substring check for the open delimiters; literal braces
/// inside plain strings produce false positives, which callers accept in
/// exchange for never having to parse here.
pub fn has_template(text: &str) -> bool {
    text.contains("{{") || text.contains("{%") || text.contains("{#")
}

/// Template engine builder
pub struct EngineBuilder {
    strict_mode: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self { strict_mode: true }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        Engine::new(self.strict_mode)
    }
}

/// The template engine.
///
/// Templates execute against an empty input context: documents pull
/// everything they need through the registered functions, so in strict
/// mode (the default) any stray variable reference is an execution error
/// rather than a silently blank substitution.
pub struct Engine {
    strict_mode: bool,
}

impl Engine {
    /// Create a new engine with default settings
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }

    /// Create a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Create a configured MiniJinja environment
    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();

        if self.strict_mode {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
        }

        transforms::register(&mut env);

        env
    }

    /// Parse and execute a single template source.
    ///
    /// A fresh environment is built per call; `bind` runs before parsing
    /// and is where the caller attaches its lookup functions. Failures are
    /// tagged with the phase they occurred in and carry the template
    /// source for diagnostics.
    pub fn render<F>(&self, source: &str, bind: F) -> Result<String, TemplateError>
    where
        F: FnOnce(&mut Environment<'static>),
    {
        let mut env = self.create_environment();
        bind(&mut env);

        env.add_template_owned(DOCUMENT_TEMPLATE.to_string(), source.to_string())
            .map_err(|e| TemplateError::parse(e, source))?;

        let tmpl = env
            .get_template(DOCUMENT_TEMPLATE)
            .map_err(|e| TemplateError::parse(e, source))?;

        let rendered = tmpl
            .render(())
            .map_err(|e| TemplateError::execute(e, source))?;

        debug!(bytes = rendered.len(), "template executed");
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplatePhase;

    #[test]
    fn test_has_template() {
        assert!(has_template("password: {{ fromSecret(\"ns\", \"db\", \"pw\") }}"));
        assert!(has_template("{% if enabled %}x{% endif %}"));
        assert!(has_template("{# comment #}"));
        assert!(!has_template("password: plain-text"));
        assert!(!has_template("single { brace } pairs"));
        assert!(!has_template(""));
    }

    #[test]
    fn test_render_plain_text_unchanged() {
        let engine = Engine::builder().build();
        let out = engine.render("name: app\nport: 8080", |_| {}).unwrap();
        assert_eq!(out, "name: app\nport: 8080");
    }

    #[test]
    fn test_render_transform_function() {
        let engine = Engine::builder().build();
        let out = engine.render("secret: {{ base64enc(\"x\") }}", |_| {}).unwrap();
        assert_eq!(out, "secret: eA==");
    }

    #[test]
    fn test_render_transform_filter_form() {
        let engine = Engine::builder().build();
        let out = engine
            .render("secret: {{ \"x\" | base64enc }}", |_| {})
            .unwrap();
        assert_eq!(out, "secret: eA==");
    }

    #[test]
    fn test_base64_decode_of_encode_is_identity() {
        let engine = Engine::builder().build();
        let out = engine
            .render("greeting: {{ base64dec(base64enc(\"hello\")) }}", |_| {})
            .unwrap();
        assert_eq!(out, "greeting: hello");
    }

    #[test]
    fn test_parse_error_is_parse_phase() {
        let engine = Engine::builder().build();
        let err = engine.render("value: {{ oops", |_| {}).unwrap_err();
        assert_eq!(err.phase(), TemplatePhase::Parse);
        assert_eq!(err.template_source(), "value: {{ oops");
    }

    #[test]
    fn test_execute_error_is_execute_phase() {
        let engine = Engine::builder().build();
        let err = engine
            .render("value: {{ base64dec(\"%%%\") }}", |_| {})
            .unwrap_err();
        assert_eq!(err.phase(), TemplatePhase::Execute);
    }

    #[test]
    fn test_strict_mode_rejects_undefined_variables() {
        let strict = Engine::builder().build();
        assert!(strict.render("value: {{ missing }}", |_| {}).is_err());

        let lenient = Engine::builder().strict(false).build();
        let out = lenient.render("value: {{ missing }}", |_| {}).unwrap();
        assert_eq!(out, "value: ");
    }

    #[test]
    fn test_bound_functions_are_available() {
        let engine = Engine::builder().build();
        let out = engine
            .render("claim: {{ clusterName() }}", |env| {
                env.add_function("clusterName", || "east-1".to_string());
            })
            .unwrap();
        assert_eq!(out, "claim: east-1");
    }

    #[test]
    fn test_conditionals_and_loops() {
        let engine = Engine::builder().build();
        let out = engine
            .render(
                "{% for port in [80, 443] %}port-{{ port }} {% endfor %}",
                |_| {},
            )
            .unwrap();
        assert_eq!(out, "port-80 port-443 ");
    }
}
