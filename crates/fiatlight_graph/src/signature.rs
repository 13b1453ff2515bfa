//! Function signatures: parameter names, kinds, defaults and annotations.
//!
//! A [`Signature`] is built by `#[fiat_function]` from the Rust signature,
//! or parsed from a user-supplied string when a callable (typically a
//! closure) does not carry its own:
//!
//! ```
//! use fiatlight_core::{FiatValue, ParamKind};
//! use fiatlight_graph::Signature;
//!
//! let sig: Signature = "add(a: int, /, b: int = 2, *, c: str = 'x') -> int".parse().unwrap();
//! assert_eq!(sig.name.as_deref(), Some("add"));
//! assert_eq!(sig.params[0].kind, ParamKind::PositionalOnly);
//! assert_eq!(sig.params[1].default, Some(FiatValue::Int(2)));
//! assert_eq!(sig.params[2].kind, ParamKind::KeywordOnly);
//! assert_eq!(sig.return_annotation.as_deref(), Some("int"));
//! ```

use core::str::FromStr;

use fiatlight_core::{FiatValue, ParamKind, RegistryError, TypeSpec};

/// A parsed or generated function signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    /// Function name, if the signature names it.
    pub name: Option<String>,
    /// Parameters, in call order.
    pub params: Vec<SignatureParam>,
    /// Return annotation, if any.
    pub return_annotation: Option<String>,
    /// Function documentation.
    pub doc: Option<String>,
}

/// One parameter of a [`Signature`].
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParam {
    /// Parameter name.
    pub name: String,
    /// Calling convention.
    pub kind: ParamKind,
    /// Type annotation, if any.
    pub annotation: Option<String>,
    /// Default value, if any.
    pub default: Option<FiatValue>,
    /// Parameter documentation, shown as tooltip.
    pub doc: Option<String>,
}

impl SignatureParam {
    /// A positional-or-keyword parameter without annotation nor default.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            annotation: None,
            default: None,
            doc: None,
        }
    }

    /// Sets the calling convention.
    #[must_use]
    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the type annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<FiatValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

impl Signature {
    /// An empty signature for the function `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, param: SignatureParam) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the return annotation.
    #[must_use]
    pub fn with_return_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.return_annotation = Some(annotation.into());
        self
    }

    /// Sets the documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Parameter names, in call order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Parses `name(a: int, /, b: int = 2, *, c: str = 'x') -> int`.
    ///
    /// The name, the annotations and the return annotation are optional.
    /// `/` ends the positional-only parameters and `*` starts the
    /// keyword-only ones. Defaults may be `None`, `True`, `False`,
    /// integers, floats, quoted strings, tuples and lists of those.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidSignature`] if the text is malformed,
    /// uses variadic parameters, repeats a parameter name, or places a
    /// parameter without default after one with a default.
    pub fn parse(text: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::invalid_signature(text, reason);

        let open = text.find('(').ok_or_else(|| invalid("missing `(`"))?;
        let close = matching_paren(text, open).ok_or_else(|| invalid("unbalanced parentheses"))?;

        let head = text[..open].trim();
        let head = head.strip_prefix("def ").map_or(head, str::trim);
        let name = if head.is_empty() {
            None
        } else if is_identifier(head) {
            Some(head.to_string())
        } else {
            return Err(invalid(&format!("`{head}` is not a valid function name")));
        };

        let tail = text[close + 1..].trim();
        let tail = tail.strip_suffix(':').map_or(tail, str::trim_end);
        let return_annotation = if tail.is_empty() {
            None
        } else {
            let annotation = tail
                .strip_prefix("->")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .ok_or_else(|| invalid(&format!("unexpected `{tail}` after the parameters")))?;
            Some(annotation.to_string())
        };

        let params = parse_params(&text[open + 1..close]).map_err(|reason| invalid(&reason))?;

        Ok(Self {
            name,
            params,
            return_annotation,
            doc: None,
        })
    }

    /// Checks that this signature describes a callable with the given
    /// parameter and return types.
    ///
    /// Arity must match. Annotations, when present, must name the same type
    /// as the callable (the full typename or its last path segment).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SignatureMismatch`] describing the first difference.
    pub fn check(&self, function: &str, param_specs: &[TypeSpec], return_spec: &TypeSpec) -> Result<(), RegistryError> {
        if self.params.len() != param_specs.len() {
            return Err(RegistryError::signature_mismatch(
                function,
                format!(
                    "the signature has {} parameters, the callable takes {}",
                    self.params.len(),
                    param_specs.len()
                ),
            ));
        }

        for (param, spec) in self.params.iter().zip(param_specs) {
            if let Some(annotation) = &param.annotation
                && !annotation_matches(annotation, spec)
            {
                return Err(RegistryError::signature_mismatch(
                    function,
                    format!(
                        "parameter `{}` is annotated `{annotation}`, the callable takes `{}`",
                        param.name,
                        spec.typename()
                    ),
                ));
            }
        }

        if let Some(annotation) = &self.return_annotation
            && !annotation_matches(annotation, return_spec)
        {
            return Err(RegistryError::signature_mismatch(
                function,
                format!(
                    "the return is annotated `{annotation}`, the callable returns `{}`",
                    return_spec.typename()
                ),
            ));
        }
        Ok(())
    }
}

impl FromStr for Signature {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

fn parse_params(text: &str) -> Result<Vec<SignatureParam>, String> {
    let mut params: Vec<SignatureParam> = Vec::new();
    if text.trim().is_empty() {
        return Ok(params);
    }
    let mut seen_slash = false;
    let mut keyword_only = false;

    let parts = split_top_level(text, ',');
    let last = parts.len().saturating_sub(1);
    for (i, part) in parts.into_iter().enumerate() {
        let part = part.trim();
        match part {
            "" if i == last && i > 0 => {}
            "" => return Err("empty parameter".to_string()),
            "/" => {
                if seen_slash || keyword_only || params.is_empty() {
                    return Err("misplaced `/`".to_string());
                }
                seen_slash = true;
                for param in &mut params {
                    param.kind = ParamKind::PositionalOnly;
                }
            }
            "*" => {
                if keyword_only {
                    return Err("duplicate `*`".to_string());
                }
                keyword_only = true;
            }
            _ if part.starts_with('*') => {
                return Err(format!("variadic parameter `{part}` is not supported"));
            }
            _ => {
                let mut param = parse_param(part)?;
                if keyword_only {
                    param.kind = ParamKind::KeywordOnly;
                }
                if params.iter().any(|p| p.name == param.name) {
                    return Err(format!("duplicate parameter `{}`", param.name));
                }
                let follows_default = params
                    .iter()
                    .any(|p| p.default.is_some() && p.kind != ParamKind::KeywordOnly);
                if follows_default && param.default.is_none() && param.kind != ParamKind::KeywordOnly {
                    return Err(format!("parameter `{}` without default follows a parameter with default", param.name));
                }
                params.push(param);
            }
        }
    }
    Ok(params)
}

fn parse_param(text: &str) -> Result<SignatureParam, String> {
    let (lhs, default) = match find_top_level(text, '=') {
        Some(eq) => (&text[..eq], Some(text[eq + 1..].trim())),
        None => (text, None),
    };
    let (name, annotation) = match find_top_level(lhs, ':') {
        Some(colon) => (lhs[..colon].trim(), Some(lhs[colon + 1..].trim())),
        None => (lhs.trim(), None),
    };
    if !is_identifier(name) {
        return Err(format!("`{name}` is not a valid parameter name"));
    }

    let mut param = SignatureParam::new(name);
    if let Some(annotation) = annotation {
        if annotation.is_empty() {
            return Err(format!("parameter `{name}` has an empty annotation"));
        }
        param.annotation = Some(annotation.to_string());
    }
    if let Some(default) = default {
        param.default = Some(parse_literal(default)?);
    }
    Ok(param)
}

/// Parses a default value literal.
fn parse_literal(text: &str) -> Result<FiatValue, String> {
    let text = text.trim();
    match text {
        "None" => return Ok(FiatValue::None),
        "True" => return Ok(FiatValue::Bool(true)),
        "False" => return Ok(FiatValue::Bool(false)),
        _ => {}
    }

    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return Ok(FiatValue::Str(text[1..text.len() - 1].to_string()));
        }
    }

    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return parse_items(inner).map(FiatValue::Tuple);
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return parse_items(inner).map(FiatValue::List);
    }

    if let Ok(v) = text.parse::<i64>() {
        return Ok(FiatValue::Int(v));
    }
    if let Ok(v) = text.parse::<f64>()
        && text.bytes().any(|b| b.is_ascii_digit())
    {
        return Ok(FiatValue::Float(v));
    }
    Err(format!("unsupported default value `{text}`"))
}

fn parse_items(text: &str) -> Result<Vec<FiatValue>, String> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parts = split_top_level(text, ',');
    let last = parts.len() - 1;
    parts
        .into_iter()
        .enumerate()
        .filter(|(i, part)| !(*i == last && *i > 0 && part.trim().is_empty()))
        .map(|(_, part)| parse_literal(part))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanning helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Scans `text`, calling `visit` with each byte offset and char found at
/// nesting depth zero and outside string literals.
fn scan_top_level(text: &str, mut visit: impl FnMut(usize, char) -> bool) {
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    for (i, ch) in text.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => {
                if !visit(i, ch) {
                    return;
                }
            }
            _ => {}
        }
    }
}

fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    scan_top_level(text, |i, ch| {
        if ch == sep {
            parts.push(&text[start..i]);
            start = i + ch.len_utf8();
        }
        true
    });
    parts.push(&text[start..]);
    parts
}

fn find_top_level(text: &str, target: char) -> Option<usize> {
    let mut found = None;
    scan_top_level(text, |i, ch| {
        if ch == target {
            found = Some(i);
            false
        } else {
            true
        }
    });
    found
}

/// Index of the `)` closing the `(` at `open`.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    for (i, ch) in text[open..].char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (ch == ')').then_some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn annotation_matches(annotation: &str, spec: &TypeSpec) -> bool {
    let compact = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let annotation = compact(annotation);
    annotation == compact(&spec.typename()) || annotation == compact(&spec.basename())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kinds_defaults_and_return() {
        let sig = Signature::parse("add(a: int, /, b: int = 2, *, c: str = 'x') -> int").unwrap();
        let names: Vec<_> = sig.param_names().collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(sig.params[0].kind, ParamKind::PositionalOnly);
        assert_eq!(sig.params[1].kind, ParamKind::PositionalOrKeyword);
        assert_eq!(sig.params[2].kind, ParamKind::KeywordOnly);
        assert_eq!(sig.params[2].default, Some(FiatValue::Str("x".into())));
        assert_eq!(sig.params[0].annotation.as_deref(), Some("int"));
    }

    #[test]
    fn name_and_annotations_are_optional() {
        let sig = Signature::parse("(x, y=1.5)").unwrap();
        assert_eq!(sig.name, None);
        assert_eq!(sig.params[0].annotation, None);
        assert_eq!(sig.params[1].default, Some(FiatValue::Float(1.5)));
        assert_eq!(sig.return_annotation, None);

        let sig = Signature::parse("def f(): ").unwrap();
        assert_eq!(sig.name.as_deref(), Some("f"));
        assert!(sig.params.is_empty());
    }

    #[test]
    fn nested_annotations_and_literals() {
        let sig = Signature::parse(
            "f(p: Tuple[int, str] = (1, 'a, b'), q: List[float] = [], r: Optional[int] = None) -> Tuple[int, int]",
        )
        .unwrap();
        assert_eq!(sig.params[0].annotation.as_deref(), Some("Tuple[int, str]"));
        assert_eq!(
            sig.params[0].default,
            Some(FiatValue::Tuple(vec![FiatValue::Int(1), FiatValue::Str("a, b".into())]))
        );
        assert_eq!(sig.params[1].default, Some(FiatValue::List(vec![])));
        assert_eq!(sig.params[2].default, Some(FiatValue::None));
        assert_eq!(sig.return_annotation.as_deref(), Some("Tuple[int, int]"));
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        for text in [
            "f(a: int",
            "f(*args)",
            "f(**kwargs)",
            "f(a, a)",
            "f(a=1, b)",
            "f(/, a)",
            "f(a) int",
            "f(a = nope)",
            "1f(a)",
        ] {
            assert!(
                matches!(Signature::parse(text), Err(RegistryError::InvalidSignature { .. })),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn keyword_only_parameters_may_skip_defaults() {
        let sig = Signature::parse("f(a=1, *, b)").unwrap();
        assert_eq!(sig.params[1].kind, ParamKind::KeywordOnly);
        assert_eq!(sig.params[1].default, None);
    }

    #[test]
    fn check_compares_arity_and_annotations() {
        let sig = Signature::parse("add(a: int, b: int = 2) -> int").unwrap();
        assert!(sig.check("add", &[TypeSpec::Int, TypeSpec::Int], &TypeSpec::Int).is_ok());

        let err = sig.check("add", &[TypeSpec::Int], &TypeSpec::Int).unwrap_err();
        assert!(err.to_string().contains("the signature has 2 parameters, the callable takes 1"));

        let err = sig
            .check("add", &[TypeSpec::Int, TypeSpec::Str], &TypeSpec::Int)
            .unwrap_err();
        assert!(matches!(err, RegistryError::SignatureMismatch { .. }));

        let sig = Signature::parse("f(p: Tuple[int,str]) -> None").unwrap();
        let tuple = TypeSpec::Tuple(vec![TypeSpec::Int, TypeSpec::Str]);
        assert!(sig.check("f", &[tuple], &TypeSpec::NoneType).is_ok());
    }
}
