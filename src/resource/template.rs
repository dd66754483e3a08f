//! `{placeholder}` templates used by endpoints and import ids

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("no value for placeholder `{{{placeholder}}}` in `{template}`")]
    Missing {
        template: String,
        placeholder: String,
    },

    #[error("unterminated placeholder in `{0}`")]
    Unterminated(String),
}

/// Names of the placeholders in `template`, in order of appearance
pub fn placeholders(template: &str) -> Result<Vec<&str>, TemplateError> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| TemplateError::Unterminated(template.to_string()))?;
        names.push(&after[..end]);
        rest = &after[end + 1..];
    }
    Ok(names)
}

/// Replace every `{name}` in `template` with `resolve(name)`.
///
/// Substituted values are inserted verbatim; callers building URL paths
/// encode them in `resolve`.
pub fn expand<F>(template: &str, resolve: F) -> Result<String, TemplateError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| TemplateError::Unterminated(template.to_string()))?;
        let name = &after[..end];
        let value = resolve(name).ok_or_else(|| TemplateError::Missing {
            template: template.to_string(),
            placeholder: name.to_string(),
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
