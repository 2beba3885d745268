//! Mermaid flowcharts: module dependencies and the routes map.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use super::{escape_label, sanitize_id};
use crate::types::RouteEntry;

const ROOT_ROUTE_ID: &str = "route_root";
const ROUTE_PREFIX: &str = "route_";

/// A Mermaid `graph` under construction.
///
/// Nodes are keyed by token. The first mention of a token declares it with
/// its label; later mentions use the bare token.
#[derive(Debug, Clone)]
pub struct Flowchart {
    direction: &'static str,
    header: Vec<String>,
    body: Vec<String>,
    footer: Vec<String>,
    declared: HashSet<String>,
}

impl Flowchart {
    /// Left-to-right graph.
    pub fn left_right() -> Self {
        Self::new("LR")
    }

    /// Top-down graph.
    pub fn top_down() -> Self {
        Self::new("TD")
    }

    fn new(direction: &'static str) -> Self {
        Self {
            direction,
            header: Vec::new(),
            body: Vec::new(),
            footer: Vec::new(),
            declared: HashSet::new(),
        }
    }

    /// Add a `%%` comment line above the body.
    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.header.push(format!("%% {}", text));
        self
    }

    /// Add an edge between two nodes, declaring them on first use.
    pub fn edge(&mut self, from: (&str, &str), to: (&str, &str)) -> &mut Self {
        let from = self.node_ref(from.0, from.1);
        let to = self.node_ref(to.0, to.1);
        self.body.push(format!("{} --> {}", from, to));
        self
    }

    /// Add a `style` line after the body.
    pub fn style(&mut self, token: &str, css: &str) -> &mut Self {
        self.footer.push(format!("style {} {}", token, css));
        self
    }

    /// Whether a token has already been declared.
    pub fn is_declared(&self, token: &str) -> bool {
        self.declared.contains(token)
    }

    fn node_ref(&mut self, token: &str, label: &str) -> String {
        if self.declared.insert(token.to_string()) {
            format!("{}[\"{}\"]", token, escape_label(label))
        } else {
            token.to_string()
        }
    }

    /// Render the diagram text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "graph {}", self.direction);

        let sections = [&self.header, &self.body, &self.footer];
        for (i, section) in sections.iter().filter(|s| !s.is_empty()).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for line in section.iter() {
                let _ = writeln!(out, "  {}", line);
            }
        }

        out
    }
}

/// Mermaid graph of module dependency edges, as `(from, to)` module paths.
///
/// An empty edge list renders the header only.
pub fn module_dependency_diagram(edges: &[(String, String)]) -> String {
    let mut chart = Flowchart::left_right();
    chart
        .comment("Module Dependencies")
        .comment("Generated from madge analysis");

    for (from, to) in edges {
        chart.edge((&sanitize_id(from), from), (&sanitize_id(to), to));
    }

    chart.render()
}

/// Diagram token for a route path.
///
/// `/` maps to `route_root`. Other paths have every character that is not
/// alphanumeric replaced with `_`, and a leading `_` becomes `route_`.
pub fn route_id(path: &str) -> String {
    if path == "/" {
        return ROOT_ROUTE_ID.to_string();
    }

    let token: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if token.is_empty() {
        ROOT_ROUTE_ID.to_string()
    } else if let Some(rest) = token.strip_prefix('_') {
        format!("{}{}", ROUTE_PREFIX, rest)
    } else {
        token
    }
}

/// Mermaid graph of the site routes hanging off a fixed root.
///
/// Routes whose tokens collide get `_2`, `_3`, ... suffixes in input order.
pub fn routes_diagram(routes: &[RouteEntry]) -> String {
    let mut chart = Flowchart::top_down();
    chart.comment("Application Routes");
    chart.edge(("Root", "/"), ("Pages", "Pages"));

    let mut seen: HashMap<String, usize> = HashMap::new();
    for route in routes {
        let base = route_id(&route.path);
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;
        let mut token = if *count == 1 {
            base.clone()
        } else {
            format!("{}_{}", base, count)
        };
        // a suffixed token can still clash with a literal route
        while chart.is_declared(&token) {
            *count += 1;
            token = format!("{}_{}", base, count);
        }
        chart.edge(("Pages", "Pages"), (&token, &route.path));
    }

    chart
        .style("Root", "fill:#2563EB,color:#fff")
        .style("Pages", "fill:#7C3AED,color:#fff");

    chart.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(file: &str, path: &str) -> RouteEntry {
        RouteEntry {
            file: file.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_route_id() {
        assert_eq!(route_id("/"), "route_root");
        assert_eq!(route_id(""), "route_root");
        assert_eq!(route_id("/about/"), "route_about_");
        assert_eq!(route_id("/contact"), "route_contact");
        assert_eq!(route_id("/blog/my-post"), "route_blog_my_post");
        assert_eq!(route_id("/blog/[slug]"), "route_blog__slug_");
    }

    #[test]
    fn test_routes_diagram() {
        let routes = vec![
            route("src/pages/index.astro", "/"),
            route("src/pages/about/index.astro", "/about/"),
            route("src/pages/contact.astro", "/contact"),
        ];
        let text = routes_diagram(&routes);

        assert!(text.starts_with("graph TD\n"));
        assert!(text.contains("%% Application Routes"));
        assert!(text.contains("Root[\"/\"] --> Pages[\"Pages\"]"));
        assert!(text.contains("Pages --> route_root[\"/\"]"));
        assert!(text.contains("Pages --> route_about_[\"/about/\"]"));
        assert!(text.contains("Pages --> route_contact[\"/contact\"]"));
        assert!(text.contains("style Root fill:#2563EB,color:#fff"));
        assert!(text.contains("style Pages fill:#7C3AED,color:#fff"));
    }

    #[test]
    fn test_routes_diagram_disambiguates_collisions() {
        let routes = vec![
            route("src/pages/a-b.astro", "/a-b"),
            route("src/pages/a_b.astro", "/a_b"),
            route("src/pages/a/b.astro", "/a/b"),
        ];
        let text = routes_diagram(&routes);

        assert!(text.contains("route_a_b[\"/a-b\"]"));
        assert!(text.contains("route_a_b_2[\"/a_b\"]"));
        assert!(text.contains("route_a_b_3[\"/a/b\"]"));
    }

    #[test]
    fn test_routes_diagram_is_deterministic() {
        let routes = vec![route("src/pages/index.astro", "/")];
        assert_eq!(routes_diagram(&routes), routes_diagram(&routes));
    }

    #[test]
    fn test_module_dependency_diagram() {
        let edges = vec![
            ("pages/index.astro".to_string(), "components/Nav.tsx".to_string()),
            ("components/Nav.tsx".to_string(), "utils/theme-init.ts".to_string()),
        ];
        let text = module_dependency_diagram(&edges);

        assert!(text.starts_with("graph LR\n"));
        assert!(text.contains("%% Module Dependencies"));
        assert!(text.contains(
            "pages_index_astro[\"pages/index.astro\"] --> components_Nav_tsx[\"components/Nav.tsx\"]"
        ));
        // second mention uses the bare token
        assert!(text.contains("components_Nav_tsx --> utils_theme_init_ts[\"utils/theme-init.ts\"]"));
    }

    #[test]
    fn test_empty_module_dependency_diagram() {
        let text = module_dependency_diagram(&[]);
        assert!(text.starts_with("graph LR\n"));
        assert!(!text.contains("-->"));
    }
}
