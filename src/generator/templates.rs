use askama::Template;

/// One operation line in the rendered module
#[derive(Debug, Clone)]
pub struct OperationEntry {
    /// Operation name (already a valid identifier)
    pub name: String,
    /// HTTP method, upper case
    pub method: String,
    /// Route under the base path, for the comment line
    pub route: String,
    /// Body expression: a single-line JSON value or `fail "..."`
    pub body: String,
}

/// One `group` block in the rendered module
#[derive(Debug, Clone)]
pub struct GroupEntry {
    pub name: String,
    pub operations: Vec<OperationEntry>,
}

/// Template data for the generated handler module
#[derive(Template)]
#[template(path = "handler_module.txt", escape = "none")]
pub struct HandlerModuleTemplateData {
    /// Document title
    pub title: String,
    /// Document version
    pub version: String,
    /// Normalized base path, without slashes
    pub base_path: String,
    /// Whether any group is emitted (imports are skipped otherwise)
    pub has_groups: bool,
    pub groups: Vec<GroupEntry>,
}

/// Make free text safe for a `//` comment line.
pub(crate) fn comment_text(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

pub(crate) fn render_module(data: &HandlerModuleTemplateData) -> Result<String, askama::Error> {
    data.render()
}
