//! Values, type reflection and widgets for Fiatlight (Layer 1).
//!
//! `fiatlight_core` turns Rust types into editable widgets:
//!
//! - [`value`] - Dynamic values ([`FiatValue`]) and widget value states ([`DataValue`])
//! - [`schema`] - The form schema ([`TypeSpec`]) describing a reflected type
//! - [`fiat_type`] - The [`FiatType`] trait mapping Rust types to schemas and values
//! - [`attributes`] - Fiat attributes: string-keyed widget hints and their forwarding rules
//! - [`data`] - [`AnyDataWithGui`]: one value, its widget and its validators
//! - [`widget`] - The [`DataWidget`] behavior table
//! - [`widgets`] - Primitive and composite widgets
//! - [`param`] - Named parameters ([`ParamWithGui`])
//! - [`registry`] - The type registry that builds widgets from schemas
//! - [`config`] - Run configuration and style
//! - [`ui`] - The rendering host interface and a scripted headless host
//!
//! # Example
//!
//! ```
//! use fiatlight_core::{FiatAttributes, FiatValue, GuiRegistry};
//!
//! let registry = GuiRegistry::new();
//! let attrs = FiatAttributes::new().with("range", (0, 10));
//! let mut data = registry.factor_type::<i64>(&attrs).unwrap();
//!
//! data.set_value(FiatValue::Int(4));
//! assert_eq!(data.present_str(), "4");
//! ```

// Self-reference so the derive macros can emit `fiatlight_core::` paths inside this crate.
extern crate self as fiatlight_core;

pub mod attributes;
pub mod config;
pub mod data;
pub mod error;
pub mod fiat_type;
pub mod param;
pub mod registry;
pub mod schema;
pub mod ui;
pub mod value;
pub mod widget;
pub mod widgets;

pub use attributes::{AttrKind, AttrValue, FiatAttributes, PossibleFiatAttributes};
pub use config::{
    AnyGuiWithDataSettings, FiatConfig, FiatRunConfig, FiatStyle, catch_function_exceptions, fiat_config,
    load_user_default_run_config, set_catch_function_exceptions, update_fiat_config,
};
pub use data::{AnyDataWithGui, Validator, typed_validator};
pub use error::{ConfigError, RegistryError, SerializationError, ValueError};
pub use fiat_type::{FiatReturn, FiatType};
pub use param::{ParamKind, ParamWithGui};
pub use registry::{
    GuiRegistry, factor, factor_type, gui_registry, gui_registry_mut, register_bound_float, register_bound_int,
    register_new_type, register_prefix, register_record, register_type, register_union_prefix, to_data_with_gui,
};
pub use schema::{Bounds, EnumSpec, EnumVariantSpec, FieldDefault, FieldSpec, NewTypeSpec, RecordKind, RecordSpec, TypeSpec};
pub use value::{CustomValue, DataValue, FiatValue};
pub use widget::DataWidget;

/// Derive macros implementing [`FiatType`] for records, enums and new types.
pub use fiatlight_core_macros::{FiatEnum, FiatNewType, FiatRecord};

/// Re-export of the common types.
pub mod prelude {
    pub use crate::attributes::*;
    pub use crate::data::*;
    pub use crate::fiat_type::*;
    pub use crate::param::*;
    pub use crate::registry::*;
    pub use crate::schema::*;
    pub use crate::value::*;
    pub use crate::widget::*;
    pub use fiatlight_core_macros::{FiatEnum, FiatNewType, FiatRecord};
}
