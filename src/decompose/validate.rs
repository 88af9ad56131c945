//! Chart validation
//!
//! Runs once over the full chart tree before any synthesis. A chart that
//! fails any check produces no tables at all; the checks are pure traversals
//! with no side effects.

use std::collections::HashSet;

use crate::chart::{Chart, PropertyDecl};
use crate::error::DecomposeError;

/// Validate a chart tree, reporting the first violation found.
pub fn validate(chart: &Chart) -> Result<(), DecomposeError> {
    check_type_names_present(chart)?;
    check_component_keys_unique(chart)?;
    check_type_names_unique(chart)?;
    check_source_paths_present(chart)?;
    Ok(())
}

/// A chart with nested types needs a type name: without one the tables of
/// parent and children could not be told apart.
fn check_type_names_present(chart: &Chart) -> Result<(), DecomposeError> {
    if !chart.nested_types.is_empty() && chart.type_name.is_none() {
        return Err(DecomposeError::MissingTypeName);
    }
    for nested in &chart.nested_types {
        check_type_names_present(nested)?;
    }
    Ok(())
}

/// Component keys must be unique across the entire tree, grouped inner keys
/// included, so every generated table name is unambiguous.
fn check_component_keys_unique(chart: &Chart) -> Result<(), DecomposeError> {
    let mut keys = Vec::new();
    collect_component_keys(chart, &mut keys);

    let mut seen = HashSet::new();
    if keys.iter().any(|key| !seen.insert(key.as_str())) {
        return Err(DecomposeError::DuplicateComponentKey(keys.join(", ")));
    }
    Ok(())
}

fn collect_component_keys(chart: &Chart, keys: &mut Vec<String>) {
    for (key, decl) in &chart.components {
        keys.push(key.clone());
        collect_decl_keys(decl, keys);
    }
    for nested in &chart.nested_types {
        collect_component_keys(nested, keys);
    }
}

fn collect_decl_keys(decl: &PropertyDecl, keys: &mut Vec<String>) {
    if let PropertyDecl::Group(group) = decl {
        for (key, inner) in group {
            keys.push(key.clone());
            collect_decl_keys(inner, keys);
        }
    }
}

/// Type names must be unique across the tree: reference tokens address
/// nested types by name.
fn check_type_names_unique(chart: &Chart) -> Result<(), DecomposeError> {
    let mut names = Vec::new();
    collect_type_names(chart, &mut names);

    let mut seen = HashSet::new();
    if names.iter().any(|name| !seen.insert(name.as_str())) {
        return Err(DecomposeError::DuplicateTypeName);
    }
    Ok(())
}

fn collect_type_names(chart: &Chart, names: &mut Vec<String>) {
    if let Some(ref name) = chart.type_name {
        names.push(name.clone());
    }
    for nested in &chart.nested_types {
        collect_type_names(nested, names);
    }
}

/// Every nested-type chart needs a source path to find its records at.
fn check_source_paths_present(chart: &Chart) -> Result<(), DecomposeError> {
    for nested in &chart.nested_types {
        if nested.source_path.is_none() {
            return Err(DecomposeError::MissingSourcePath);
        }
        check_source_paths_present(nested)?;
    }
    Ok(())
}
