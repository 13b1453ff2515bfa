//! [`FunctionWithGui`]: a callable with one widget per parameter and per output.

use core::fmt;
use std::sync::Arc;

use fiatlight_core::{
    AnyDataWithGui, AttrKind, DataValue, FiatAttributes, FiatType, FiatValue, ParamWithGui, PossibleFiatAttributes,
    RegistryError, TypeSpec, catch_function_exceptions, factor,
};
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tracing::{debug, warn};

use crate::callable::{DynCallable, FiatFunctionParts, FunctionFailure, IntoFiatFunction, call_catching};
use crate::error::{FunctionError, GraphError};
use crate::signature::{Signature, SignatureParam};

fn function_attributes() -> PossibleFiatAttributes {
    PossibleFiatAttributes::new("FunctionWithGui")
        .add_with_default(
            "invoke_async",
            AttrKind::Bool,
            "Run the function on a worker thread; the result is applied on a later frame",
            false,
        )
        .add_with_default(
            "invoke_manually",
            AttrKind::Bool,
            "Only run when the user presses the invoke button",
            false,
        )
        .add_with_default(
            "invoke_always_dirty",
            AttrKind::Bool,
            "Consider the outputs stale on every frame (e.g. for random generators or live sources)",
            false,
        )
        .add("doc", AttrKind::Str, "Documentation shown in the node")
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`FunctionWithGui`].
///
/// Obtained from [`FunctionWithGui::builder`]. Without a signature the
/// parameters are named `p0..pn`, are positional-or-keyword and have no
/// default.
pub struct FunctionWithGuiBuilder {
    name: String,
    parts: FiatFunctionParts,
    signature: Option<Signature>,
    attributes: FiatAttributes,
    doc: Option<String>,
    error: Option<RegistryError>,
}

impl FunctionWithGuiBuilder {
    /// Uses a parsed signature (see [`Signature::parse`]).
    ///
    /// A parse error is reported by [`build`](Self::build).
    #[must_use]
    pub fn signature_str(mut self, text: &str) -> Self {
        match Signature::parse(text) {
            Ok(signature) => self.signature = Some(signature),
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Uses an explicit signature.
    #[must_use]
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Names the parameters, keeping the other signature defaults.
    #[must_use]
    pub fn param_names(mut self, names: &[&str]) -> Self {
        let mut signature = Signature::new(self.name.clone());
        for name in names {
            signature = signature.with_param(SignatureParam::new(*name));
        }
        self.signature = Some(signature);
        self
    }

    /// Adds fiat attributes (function-level and forwarded).
    #[must_use]
    pub fn attributes(mut self, attributes: FiatAttributes) -> Self {
        self.attributes.merge(&attributes);
        self
    }

    /// Sets the documentation.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Creates the widgets and returns the function.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the signature is malformed or does not
    /// match the callable, if an attribute is unknown or addresses a
    /// parameter that does not exist, or if a widget rejects its attributes.
    pub fn build(self) -> Result<FunctionWithGui, RegistryError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let FiatFunctionParts {
            param_specs,
            return_spec,
            callable,
        } = self.parts;

        let signature = match self.signature {
            Some(signature) => {
                signature.check(&self.name, &param_specs, &return_spec)?;
                signature
            }
            None => {
                let mut signature = Signature::new(self.name.clone());
                for idx in 0..param_specs.len() {
                    signature = signature.with_param(SignatureParam::new(format!("p{idx}")));
                }
                signature
            }
        };
        let doc = self.doc.or_else(|| signature.doc.clone());

        FunctionWithGui::assemble(
            self.name,
            &signature,
            &param_specs,
            return_spec,
            callable,
            &self.attributes,
            doc,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FunctionWithGui
// ─────────────────────────────────────────────────────────────────────────────

/// A function whose parameters and outputs are widgets.
///
/// Invoking reads every parameter (the user value or its default), calls
/// the function and assigns the outputs. A tuple return with two or more
/// slots has one output per slot; a unit return has no output.
///
/// # Example
///
/// ```
/// use fiatlight_core::FiatValue;
/// use fiatlight_graph::FunctionWithGui;
///
/// fn add(a: i64, b: i64) -> i64 {
///     a + b
/// }
///
/// let mut f = FunctionWithGui::builder("add", add)
///     .signature_str("add(a: int, b: int = 2) -> int")
///     .build()
///     .unwrap();
/// f.set_param_value("a", FiatValue::Int(3)).unwrap();
/// f.invoke().unwrap();
/// assert_eq!(f.output(0).unwrap().value().as_value(), Some(&FiatValue::Int(5)));
/// ```
pub struct FunctionWithGui {
    name: String,
    label: Option<String>,
    doc: Option<String>,
    callable: DynCallable,
    return_spec: TypeSpec,
    inputs: Vec<ParamWithGui>,
    outputs: Vec<AnyDataWithGui>,

    invoke_manually: bool,
    invoke_always_dirty: bool,
    invoke_async: bool,

    dirty: bool,
    last_exception: Option<FunctionFailure>,
    is_dataclass_init_method: bool,
    internal_gui_options: JsonValue,
}

impl FunctionWithGui {
    /// Starts building a function named `name` around `f`.
    pub fn builder<Marker>(name: impl Into<String>, f: impl IntoFiatFunction<Marker>) -> FunctionWithGuiBuilder {
        FunctionWithGuiBuilder {
            name: name.into(),
            parts: f.into_parts(),
            signature: None,
            attributes: FiatAttributes::new(),
            doc: None,
            error: None,
        }
    }

    /// Wraps `f` with parameters named `p0..pn`.
    ///
    /// # Errors
    ///
    /// See [`FunctionWithGuiBuilder::build`].
    pub fn new<Marker>(name: impl Into<String>, f: impl IntoFiatFunction<Marker>) -> Result<Self, RegistryError> {
        Self::builder(name, f).build()
    }

    /// A function building the record `T` from one parameter per field.
    ///
    /// Field defaults, docs and attributes carry over to the parameters; a
    /// model validator runs on the assembled record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotARecord`] if `T` is not a record, or any
    /// widget creation error.
    pub fn record_constructor<T: FiatType>() -> Result<Self, RegistryError> {
        let spec = T::type_spec();
        let TypeSpec::Record(record) = &spec else {
            return Err(RegistryError::NotARecord {
                typename: spec.typename(),
            });
        };

        let name = spec.basename();
        let mut signature = Signature::new(name.clone());
        let mut attributes = record.fiat_attributes.clone();
        for field in &record.fields {
            let mut param = SignatureParam::new(field.name.clone());
            if let Some(default) = &field.default {
                param = param.with_default(default.produce());
            }
            if let Some(doc) = &field.doc {
                param = param.with_doc(doc.clone());
            }
            signature = signature.with_param(param);
            for (attr, value) in field.fiat_attributes.iter() {
                attributes.insert_attr(format!("{}__{attr}", field.name), value.clone());
            }
        }
        let param_specs: Vec<TypeSpec> = record.fields.iter().map(|f| f.spec.clone()).collect();

        let constructed = record.clone();
        let callable: DynCallable = Arc::new(move |args: Vec<FiatValue>| -> Result<FiatValue, String> {
            let names = constructed.fields.iter().map(|f| f.name.clone());
            let value = FiatValue::record(constructed.typename.clone(), names.zip(args));
            let value = match &constructed.model_validator {
                Some(validator) => validator(&value)?,
                None => value,
            };
            T::from_fiat(value).map(FiatType::into_fiat).map_err(|e| e.to_string())
        });

        let mut function = Self::assemble(
            name,
            &signature,
            &param_specs,
            spec.clone(),
            callable,
            &attributes,
            record.doc.clone(),
        )?;
        function.is_dataclass_init_method = true;
        Ok(function)
    }

    fn assemble(
        name: String,
        signature: &Signature,
        param_specs: &[TypeSpec],
        return_spec: TypeSpec,
        callable: DynCallable,
        attributes: &FiatAttributes,
        doc: Option<String>,
    ) -> Result<Self, RegistryError> {
        let own = attributes.own();
        function_attributes().validate(&own)?;

        let output_specs = output_specs(&return_spec);
        check_forwarded_attributes(&name, attributes, signature, output_specs.len())?;

        let mut inputs = Vec::with_capacity(param_specs.len());
        for (param, spec) in signature.params.iter().zip(param_specs) {
            let mut data = factor(spec, &attributes.for_param(&param.name))?;
            if data.tooltip().is_none()
                && let Some(doc) = &param.doc
            {
                data.set_tooltip(doc.clone());
            }
            let default_value = match &param.default {
                Some(value) => DataValue::Value(value.clone()),
                None if data.can_be_none() => DataValue::Value(FiatValue::None),
                None => DataValue::Unspecified,
            };
            inputs.push(ParamWithGui::new(param.name.clone(), data, param.kind, default_value));
        }

        let single_output = output_specs.len() == 1;
        let mut outputs = Vec::with_capacity(output_specs.len());
        for (idx, spec) in output_specs.iter().enumerate() {
            // `return__*` addresses output 0; `return_0__*` overrides it.
            let mut output_attrs = if idx == 0 {
                attributes.forwarded("return__")
            } else {
                FiatAttributes::new()
            };
            output_attrs.merge(&attributes.forwarded(&format!("return_{idx}__")));
            let mut data = factor(spec, &output_attrs)?;
            if data.label().is_none() {
                data.set_label(if single_output { "return".to_string() } else { format!("return_{idx}") });
            }
            outputs.push(data);
        }

        let doc = doc.or_else(|| own.get_str("doc").map(str::to_string));
        debug!(function = %name, nb_inputs = inputs.len(), nb_outputs = outputs.len(), "function wrapped");

        Ok(Self {
            label: own.get_str("label").map(str::to_string),
            invoke_manually: own.get_bool("invoke_manually").unwrap_or(false),
            invoke_always_dirty: own.get_bool("invoke_always_dirty").unwrap_or(false),
            invoke_async: own.get_bool("invoke_async").unwrap_or(false),
            name,
            doc,
            callable,
            return_spec,
            inputs,
            outputs,
            dirty: true,
            last_exception: None,
            is_dataclass_init_method: false,
            internal_gui_options: json!({}),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// Function name (the basis of the node's unique name in a graph).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the function.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Display label: the `label` attribute, else the name.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Documentation, if any.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Shape of the return value.
    #[must_use]
    pub fn return_spec(&self) -> &TypeSpec {
        &self.return_spec
    }

    /// Whether this function constructs a record from its fields.
    #[must_use]
    pub fn is_dataclass_init_method(&self) -> bool {
        self.is_dataclass_init_method
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inputs and outputs
    // ─────────────────────────────────────────────────────────────────────────

    /// Parameters, in call order.
    #[must_use]
    pub fn inputs(&self) -> &[ParamWithGui] {
        &self.inputs
    }

    /// Parameters, mutably. Edits made here do not mark the function dirty.
    pub fn inputs_mut(&mut self) -> &mut [ParamWithGui] {
        &mut self.inputs
    }

    /// Parameter names, in call order.
    #[must_use]
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|p| p.name.as_str()).collect()
    }

    /// The parameter named `name`.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&ParamWithGui> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// The parameter named `name`, mutably.
    pub fn input_mut(&mut self, name: &str) -> Option<&mut ParamWithGui> {
        self.inputs.iter_mut().find(|p| p.name == name)
    }

    /// Number of parameters.
    #[must_use]
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Output widgets.
    #[must_use]
    pub fn outputs(&self) -> &[AnyDataWithGui] {
        &self.outputs
    }

    /// Output widgets, mutably.
    pub fn outputs_mut(&mut self) -> &mut [AnyDataWithGui] {
        &mut self.outputs
    }

    /// The output widget `idx`.
    #[must_use]
    pub fn output(&self, idx: usize) -> Option<&AnyDataWithGui> {
        self.outputs.get(idx)
    }

    /// The output widget `idx`, mutably.
    pub fn output_mut(&mut self, idx: usize) -> Option<&mut AnyDataWithGui> {
        self.outputs.get_mut(idx)
    }

    /// Number of outputs.
    #[must_use]
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Assigns a parameter value (validators run) and marks the function dirty.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownInput`] if there is no such parameter.
    pub fn set_param_value(&mut self, name: &str, value: impl Into<DataValue>) -> Result<(), GraphError> {
        let Some(param) = self.inputs.iter_mut().find(|p| p.name == name) else {
            return Err(GraphError::UnknownInput {
                function: self.name.clone(),
                input: name.to_string(),
            });
        };
        param.data_with_gui.set_value(value);
        self.dirty = true;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invocation state
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether the outputs are stale.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the outputs stale.
    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the function only runs on demand.
    #[must_use]
    pub fn invoke_manually(&self) -> bool {
        self.invoke_manually
    }

    /// Sets [`invoke_manually`](Self::invoke_manually).
    pub fn set_invoke_manually(&mut self, manual: bool) {
        self.invoke_manually = manual;
    }

    /// Whether the outputs are considered stale on every frame.
    #[must_use]
    pub fn invoke_always_dirty(&self) -> bool {
        self.invoke_always_dirty
    }

    /// Sets [`invoke_always_dirty`](Self::invoke_always_dirty).
    pub fn set_invoke_always_dirty(&mut self, always_dirty: bool) {
        self.invoke_always_dirty = always_dirty;
    }

    /// Whether the function may run on a worker thread.
    #[must_use]
    pub fn invoke_async(&self) -> bool {
        self.invoke_async
    }

    /// Sets [`invoke_async`](Self::invoke_async).
    pub fn set_invoke_async(&mut self, invoke_async: bool) {
        self.invoke_async = invoke_async;
    }

    /// A live function refreshes on every frame without user action.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.invoke_manually && self.invoke_always_dirty
    }

    /// The failure of the last invocation, if it failed.
    #[must_use]
    pub fn last_exception(&self) -> Option<&FunctionFailure> {
        self.last_exception.as_ref()
    }

    /// Calls the function if it is dirty.
    ///
    /// If an argument is `Unspecified`, `Error` or `Invalid`, every output
    /// becomes `Unspecified` and the function is not called. A failure
    /// turns every output into `Error` when failures are caught (see
    /// [`catch_function_exceptions`]); otherwise it is returned and the
    /// function stays dirty.
    ///
    /// # Errors
    ///
    /// Returns a [`FunctionError`] only when failures are not caught.
    pub fn invoke(&mut self) -> Result<(), FunctionError> {
        if !self.dirty {
            return Ok(());
        }
        let Some(args) = self.collect_arguments() else {
            self.apply_missing_inputs();
            return Ok(());
        };
        let outcome = call_catching(&self.callable, args);
        self.apply_outcome(outcome)
    }

    pub(crate) fn callable(&self) -> DynCallable {
        Arc::clone(&self.callable)
    }

    pub(crate) fn collect_arguments(&self) -> Option<Vec<FiatValue>> {
        self.inputs
            .iter()
            .map(|p| match p.get_value_or_default() {
                DataValue::Value(value) => Some(value),
                DataValue::Unspecified | DataValue::Error | DataValue::Invalid { .. } => None,
            })
            .collect()
    }

    pub(crate) fn apply_missing_inputs(&mut self) {
        for output in &mut self.outputs {
            output.set_value(DataValue::Unspecified);
        }
        self.dirty = false;
    }

    pub(crate) fn apply_outcome(&mut self, outcome: Result<FiatValue, FunctionFailure>) -> Result<(), FunctionError> {
        match outcome {
            Ok(value) => {
                self.last_exception = None;
                self.assign_outputs(value);
                self.dirty = false;
                Ok(())
            }
            Err(failure) if catch_function_exceptions() => {
                warn!(function = %self.name, message = %failure.message, "function invocation failed");
                for output in &mut self.outputs {
                    output.set_value(DataValue::Error);
                }
                self.last_exception = Some(failure);
                self.dirty = false;
                Ok(())
            }
            Err(failure) => {
                self.last_exception = Some(failure.clone());
                Err(failure.into_function_error(&self.name))
            }
        }
    }

    fn assign_outputs(&mut self, value: FiatValue) {
        match (self.outputs.len(), value) {
            (0, _) => {}
            (n, FiatValue::Tuple(items)) if n >= 2 && items.len() == n => {
                for (output, item) in self.outputs.iter_mut().zip(items) {
                    output.set_value(item);
                }
            }
            (_, value) => {
                if let Some(output) = self.outputs.first_mut() {
                    output.set_value(value);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Documentation and persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Markdown documentation: name, doc and a parameter table.
    #[must_use]
    pub fn documentation(&self) -> String {
        let mut doc = format!("# {}\n\n", self.label());
        if let Some(text) = &self.doc {
            doc.push_str(text);
            doc.push_str("\n\n");
        }
        if !self.inputs.is_empty() {
            doc.push_str("| Parameter | Type | Default |\n|---|---|---|\n");
            for param in &self.inputs {
                let default = param
                    .default_value
                    .as_value()
                    .map_or_else(String::new, ToString::to_string);
                doc.push_str(&format!(
                    "| {} | {} | {default} |\n",
                    param.name,
                    param.data_with_gui.typename()
                ));
            }
            doc.push('\n');
        }
        doc.push_str(&format!("Returns: {}\n", self.return_spec.typename()));
        doc
    }

    /// Opaque per-function layout state kept by the host.
    #[must_use]
    pub fn internal_gui_options(&self) -> &JsonValue {
        &self.internal_gui_options
    }

    /// Replaces the per-function layout state.
    pub fn set_internal_gui_options(&mut self, options: JsonValue) {
        self.internal_gui_options = options;
    }

    /// Layout state of every widget:
    /// `{"inputs": {name: ..}, "outputs": {"<idx>": ..}, "internal_gui_options": ..}`.
    #[must_use]
    pub fn save_gui_options_to_json(&self) -> JsonValue {
        let inputs: JsonMap<String, JsonValue> = self
            .inputs
            .iter()
            .map(|p| (p.name.clone(), p.save_gui_options_to_json()))
            .collect();
        let outputs: JsonMap<String, JsonValue> = self
            .outputs
            .iter()
            .enumerate()
            .map(|(idx, o)| (idx.to_string(), o.save_gui_options_to_json()))
            .collect();
        json!({
            "inputs": inputs,
            "outputs": outputs,
            "internal_gui_options": self.internal_gui_options,
        })
    }

    /// Restores layout state; unknown entries are ignored.
    pub fn load_gui_options_from_json(&mut self, json: &JsonValue) {
        if let Some(inputs) = json.get("inputs").and_then(JsonValue::as_object) {
            for (name, options) in inputs {
                match self.input_mut(name) {
                    Some(param) => param.load_gui_options_from_json(options),
                    None => debug!(function = %self.name, input = %name, "ignoring options of unknown input"),
                }
            }
        }
        if let Some(outputs) = json.get("outputs").and_then(JsonValue::as_object) {
            for (idx, options) in outputs {
                if let Some(output) = idx.parse::<usize>().ok().and_then(|idx| self.outputs.get_mut(idx)) {
                    output.load_gui_options_from_json(options);
                }
            }
        }
        if let Some(internal) = json.get("internal_gui_options") {
            self.internal_gui_options = internal.clone();
        }
    }

    /// Releases the resources held by every widget.
    pub fn on_exit(&mut self) {
        for param in &mut self.inputs {
            param.data_with_gui.on_exit();
        }
        for output in &mut self.outputs {
            output.on_exit();
        }
    }

    /// Runs the widget heartbeats; returns `true` if an input needs a refresh.
    pub fn on_heartbeat(&mut self) -> bool {
        let mut changed = false;
        for param in &mut self.inputs {
            changed |= param.data_with_gui.on_heartbeat();
        }
        for output in &mut self.outputs {
            output.on_heartbeat();
        }
        changed
    }
}

impl fmt::Debug for FunctionWithGui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionWithGui")
            .field("name", &self.name)
            .field("inputs", &self.input_names())
            .field("nb_outputs", &self.outputs.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

fn output_specs(return_spec: &TypeSpec) -> Vec<TypeSpec> {
    match return_spec {
        TypeSpec::NoneType => Vec::new(),
        TypeSpec::Tuple(items) if items.len() >= 2 => items.clone(),
        other => vec![other.clone()],
    }
}

/// `x__*` must name a parameter, `return__*` needs an output and
/// `return_<i>__*` needs output `i`.
fn check_forwarded_attributes(
    function: &str,
    attributes: &FiatAttributes,
    signature: &Signature,
    nb_outputs: usize,
) -> Result<(), RegistryError> {
    for attribute in attributes.names() {
        let Some((target, _)) = attribute.split_once("__") else {
            continue;
        };
        let known = if target == "return" {
            nb_outputs >= 1
        } else if let Some(idx) = target.strip_prefix("return_").and_then(|i| i.parse::<usize>().ok()) {
            idx < nb_outputs
        } else {
            signature.param_names().any(|name| name == target)
        };
        if !known {
            return Err(RegistryError::UnknownParameter {
                function: function.to_string(),
                param: target.to_string(),
                attribute: attribute.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use fiatlight_core::{ParamKind, typed_validator};

    use super::*;

    fn add(a: i64, b: i64) -> i64 {
        a + b
    }

    fn add_fn() -> FunctionWithGui {
        FunctionWithGui::builder("add", add)
            .signature_str("add(a: int, b: int = 2) -> int")
            .build()
            .unwrap()
    }

    #[test]
    fn signature_names_params_and_defaults() {
        let f = add_fn();
        assert_eq!(f.input_names(), vec!["a", "b"]);
        assert!(!f.input("a").unwrap().has_default());
        assert_eq!(f.input("b").unwrap().default_value, DataValue::Value(FiatValue::Int(2)));
        assert_eq!(f.nb_outputs(), 1);
        assert!(f.is_dirty());
    }

    #[test]
    fn without_signature_params_are_numbered() {
        let f = FunctionWithGui::new("add", add).unwrap();
        assert_eq!(f.input_names(), vec!["p0", "p1"]);
        assert_eq!(f.input("p0").unwrap().param_kind, ParamKind::PositionalOrKeyword);
    }

    #[test]
    fn mismatched_signature_is_rejected() {
        let err = FunctionWithGui::builder("add", add)
            .signature_str("add(a: int) -> int")
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::SignatureMismatch { .. }));

        let err = FunctionWithGui::builder("add", add)
            .signature_str("add(a: int, b: str)")
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::SignatureMismatch { .. }));
    }

    #[test]
    fn invoke_uses_defaults_and_clears_dirty() {
        let mut f = add_fn();
        f.set_param_value("a", FiatValue::Int(3)).unwrap();
        f.invoke().unwrap();
        assert!(!f.is_dirty());
        assert_eq!(f.output(0).unwrap().value(), &DataValue::Value(FiatValue::Int(5)));
    }

    #[test]
    fn missing_input_short_circuits_to_unspecified() {
        let mut f = add_fn();
        f.invoke().unwrap();
        assert!(!f.is_dirty());
        assert!(f.output(0).unwrap().value().is_unspecified());
    }

    #[test]
    fn invalid_input_inhibits_invocation() {
        let mut attrs = FiatAttributes::new();
        attrs.insert_attr(
            "a__validator",
            typed_validator(|x: i64| if x % 2 == 0 { Ok(x) } else { Err("must be even".into()) }).into(),
        );
        let mut f = FunctionWithGui::builder("add", add)
            .signature_str("add(a, b=2)")
            .attributes(attrs)
            .build()
            .unwrap();
        f.set_param_value("a", FiatValue::Int(3)).unwrap();
        assert!(f.input("a").unwrap().data_with_gui.value().is_invalid());
        f.invoke().unwrap();
        assert!(f.output(0).unwrap().value().is_unspecified());
    }

    #[test]
    fn tuple_returns_get_one_output_per_slot() {
        let mut f = FunctionWithGui::builder("divmod", |a: i64, b: i64| (a / b, a % b))
            .param_names(&["a", "b"])
            .build()
            .unwrap();
        assert_eq!(f.nb_outputs(), 2);
        f.set_param_value("a", FiatValue::Int(7)).unwrap();
        f.set_param_value("b", FiatValue::Int(2)).unwrap();
        f.invoke().unwrap();
        assert_eq!(f.output(0).unwrap().value().as_value(), Some(&FiatValue::Int(3)));
        assert_eq!(f.output(1).unwrap().value().as_value(), Some(&FiatValue::Int(1)));
    }

    #[test]
    fn unit_return_has_no_output() {
        let f = FunctionWithGui::new("log", |_x: i64| ()).unwrap();
        assert_eq!(f.nb_outputs(), 0);
    }

    #[test]
    fn optional_param_defaults_to_none() {
        let mut f = FunctionWithGui::builder("or_zero", |x: Option<i64>| x.unwrap_or(0))
            .param_names(&["x"])
            .build()
            .unwrap();
        assert_eq!(f.input("x").unwrap().default_value, DataValue::Value(FiatValue::None));
        f.invoke().unwrap();
        assert_eq!(f.output(0).unwrap().value().as_value(), Some(&FiatValue::Int(0)));
    }

    #[test]
    fn attributes_are_forwarded_and_checked() {
        let attrs = FiatAttributes::new()
            .with("a__range", (0, 100))
            .with("return__label", "sum")
            .with("invoke_manually", true);
        let f = FunctionWithGui::builder("add", add)
            .param_names(&["a", "b"])
            .attributes(attrs)
            .build()
            .unwrap();
        assert_eq!(f.input("a").unwrap().data_with_gui.fiat_attributes().range(), Some((0.0, 100.0)));
        assert_eq!(f.output(0).unwrap().label(), Some("sum"));
        assert!(f.invoke_manually());
        assert!(!f.is_live());

        let err = FunctionWithGui::builder("add", add)
            .param_names(&["a", "b"])
            .attributes(FiatAttributes::new().with("c__range", (0, 1)))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownParameter { ref param, .. } if param == "c"));

        let err = FunctionWithGui::builder("add", add)
            .attributes(FiatAttributes::new().with("return_1__label", "x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownParameter { .. }));

        let err = FunctionWithGui::builder("add", add)
            .attributes(FiatAttributes::new().with("invoke_sometimes", true))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownAttribute { .. }));
    }

    #[test]
    fn indexed_output_attributes_override_the_shared_ones() {
        let attrs = FiatAttributes::new()
            .with("return__label", "quotient")
            .with("return__range", (0, 10))
            .with("return_0__label", "q")
            .with("return_1__label", "r");
        let f = FunctionWithGui::builder("divmod", |a: i64, b: i64| (a / b, a % b))
            .param_names(&["a", "b"])
            .attributes(attrs)
            .build()
            .unwrap();
        assert_eq!(f.nb_outputs(), 2);
        let first = f.output(0).unwrap();
        assert_eq!(first.label(), Some("q"));
        assert_eq!(first.fiat_attributes().range(), Some((0.0, 10.0)));
        let second = f.output(1).unwrap();
        assert_eq!(second.label(), Some("r"));
        assert_eq!(second.fiat_attributes().range(), None);
    }

    #[test]
    fn gui_options_round_trip() {
        let mut f = add_fn();
        f.input_mut("a").unwrap().data_with_gui.set_expanded(false);
        f.set_internal_gui_options(json!({"width": 12}));
        let saved = f.save_gui_options_to_json();
        assert!(saved["outputs"].get("0").is_some());

        let mut g = add_fn();
        g.load_gui_options_from_json(&saved);
        assert!(!g.input("a").unwrap().data_with_gui.is_expanded());
        assert_eq!(g.internal_gui_options(), &json!({"width": 12}));
    }

    #[test]
    fn documentation_lists_parameters() {
        let f = add_fn();
        let doc = f.documentation();
        assert!(doc.starts_with("# add"));
        assert!(doc.contains("| b | int | 2 |"));
    }
}
