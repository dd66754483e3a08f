//! Rendering of exported records.
//!
//! Generate mode writes `resource` blocks, import mode writes one import
//! command (or `import` block) per record. Both walk the exports in the same
//! order with the same [`naming::ResourceNamer`], so the addresses they
//! produce line up.

pub mod block;
pub mod import;
pub mod naming;

use crate::export::ResourceExport;
use anyhow::{Context, Result};
use block::ResourceBlock;
use naming::ResourceNamer;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Generate,
    Import { modern: bool },
}

/// Render every record of every export
pub fn render(exports: &[ResourceExport], mode: OutputMode) -> Result<String> {
    let mut namer = ResourceNamer::new();
    let mut chunks: Vec<String> = Vec::new();

    for export in exports {
        for record in &export.records {
            let name = namer.name_for(export, record);
            match mode {
                OutputMode::Generate => {
                    let scope = export
                        .def
                        .scope_attribute
                        .then(|| (export.scope.attribute(), export.scope.id.as_str()));
                    chunks.push(
                        ResourceBlock {
                            resource_type: &export.resource_type,
                            name: &name,
                            scope,
                            record: &record.value,
                            map_attributes: &export.def.map_attributes,
                        }
                        .render()?,
                    );
                }
                OutputMode::Import { modern } => {
                    let id = match import::import_id(export, record) {
                        Ok(id) => id,
                        Err(e) => {
                            tracing::warn!(
                                "Skipping {}.{} import: {}",
                                export.resource_type,
                                name,
                                e
                            );
                            continue;
                        }
                    };
                    chunks.push(if modern {
                        block::import_block(&export.resource_type, &name, &id)?
                    } else {
                        import::import_command(&export.resource_type, &name, &id)
                    });
                }
            }
        }
    }

    let separator = match mode {
        OutputMode::Import { modern: false } => "",
        _ => "\n",
    };
    Ok(chunks.join(separator))
}

/// Write rendered output to `path`, or stdout when `None`
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Written: {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
