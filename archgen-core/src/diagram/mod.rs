//! Diagram synthesis.
//!
//! Every function here is a pure projection from analysis records to
//! diagram source text. Identical inputs always produce identical text, and
//! missing optional data shrinks a diagram instead of failing it.
//!
//! - [`mermaid`]: flowcharts for module dependencies and routes
//! - [`c4`]: C4-PlantUML system context, container and component levels
//! - [`class_diagram`]: Mermaid class diagram for the code level

pub mod c4;
pub mod class_diagram;
pub mod mermaid;

pub use c4::{component_diagram, container_diagram, system_context_diagram, DISPLAY_CAP};
pub use class_diagram::class_diagram;
pub use mermaid::{module_dependency_diagram, route_id, routes_diagram, Flowchart};

/// Turn a path-like string into a diagram-safe token.
///
/// `/`, `.` and `-` become `_`. Applying it twice is the same as once.
pub fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '.' | '-' => '_',
            c => c,
        })
        .collect()
}

/// Escape a label for use inside double quotes.
pub(crate) fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;")
}
