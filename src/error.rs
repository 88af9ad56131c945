use thiserror::Error;

/// Errors raised while validating a chart or resolving its declarations.
///
/// Every failure is fatal for the current invocation: the engine never
/// returns a partial table set. Missing data (an absent path segment, an
/// absent nested instance, an empty reference target) is not an error and
/// resolves to "no value" instead.
#[derive(Debug, Error)]
pub enum DecomposeError {
    /// A chart declares nested types but carries no `typeName`, so table
    /// namespaces cannot be derived.
    #[error("If subtypes are defined, _name must be provided!")]
    MissingTypeName,

    /// A nested-type chart omits the source path its child records live at.
    #[error("If subtypes are defined, _path must be provided!")]
    MissingSourcePath,

    /// Two component keys collide somewhere in the chart tree.
    #[error("All component names must be unique within one chart! Component names: {0}")]
    DuplicateComponentKey(String),

    /// Two nested-type names collide somewhere in the chart tree.
    #[error("All _name properties must be unique within one chart!")]
    DuplicateTypeName,

    /// A reference token names a component its target chart never declares.
    #[error("Could not find component {component} in destination chart! Destination Chart: {chart}")]
    UnknownComponent { component: String, chart: String },

    /// A reference token was used on a chart without nested types, so there
    /// is no nested table set to resolve it against.
    #[error("References to nested types are not possible without defining _types in the chart!")]
    ReferenceWithoutNestedTypes,

    /// The chart's JSON form could not be parsed into the typed representation.
    #[error("Invalid chart: {0}")]
    InvalidChart(String),

    /// A produced table ended up without a matching schema row. Indicates a
    /// mismatch between the component and schema synthesizer walks.
    #[error("Could not find TableCfg for table {0}!")]
    MissingTableCfg(String),
}
