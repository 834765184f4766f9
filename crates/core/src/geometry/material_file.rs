//! Material-definition resources that accompany imported geometry
//!
//! A material file is plain text. Lines starting with a single `#` are
//! commands; `##` starts a comment; everything else is ignored. Each command
//! is tagged with `{<file stem>}` so the materials it defines are traceable
//! to the file they came from.

use std::fs;
use std::path::Path;

use crate::error::{GeometryError, Result};
use crate::grid::{DebyeDispersion, MaterialSpec};

/// Keep the command lines of a material file and tag each with `{label}`
pub fn material_commands(text: &str, label: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.starts_with('#') && !line.starts_with("##"))
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{line}{{{label}}}"))
        .collect()
}

/// Read a material file and return its tagged command lines
///
/// The label is the file name without its extension.
///
/// # Errors
///
/// Returns [`GeometryError::Io`] if the file cannot be read
pub fn read_material_commands(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| GeometryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let label = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(material_commands(&text, &label))
}

/// Turns material command lines into material definitions.
///
/// The full command pipeline lives outside this crate; geometry import only
/// needs the materials a file defines.
pub trait MaterialCommandProcessor {
    /// Interpret `commands` in order
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MaterialCommand`] for a line that cannot be
    /// interpreted
    fn materials_from_commands(&self, commands: &[String]) -> Result<Vec<MaterialSpec>>;
}

/// Understands `#material:` and `#add_dispersion_debye:`
///
/// ```text
/// #material: er se mr sm id
/// #add_dispersion_debye: poles delta_er1 tau1 [delta_er2 tau2 ...] id
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HashCommandProcessor;

impl MaterialCommandProcessor for HashCommandProcessor {
    fn materials_from_commands(&self, commands: &[String]) -> Result<Vec<MaterialSpec>> {
        let mut materials: Vec<MaterialSpec> = Vec::new();
        for line in commands {
            let fail = |message: String| GeometryError::MaterialCommand {
                line: line.clone(),
                message,
            };
            let (name, args) = line
                .split_once(':')
                .ok_or_else(|| fail("missing ':' after command name".to_string()))?;
            let tokens: Vec<&str> = args.split_whitespace().collect();
            let number = |s: &str| {
                s.parse::<f64>()
                    .map_err(|_| fail(format!("'{s}' is not a number")))
            };

            match name.trim() {
                "#material" => {
                    if tokens.len() != 5 {
                        return Err(fail(format!(
                            "requires exactly five parameters, got {}",
                            tokens.len()
                        )));
                    }
                    let spec = MaterialSpec::simple(
                        tokens[4],
                        number(tokens[0])?,
                        number(tokens[1])?,
                        number(tokens[2])?,
                        number(tokens[3])?,
                    );
                    if materials.iter().any(|m| m.id == spec.id) {
                        return Err(GeometryError::DuplicateMaterial(spec.id));
                    }
                    materials.push(spec);
                }
                "#add_dispersion_debye" => {
                    let (id, values) = tokens
                        .split_last()
                        .ok_or_else(|| fail("requires at least four parameters".to_string()))?;
                    let poles = values
                        .first()
                        .and_then(|p| p.parse::<usize>().ok())
                        .ok_or_else(|| fail("first parameter must be the number of poles".to_string()))?;
                    if poles == 0 || values.len() != 1 + 2 * poles {
                        return Err(fail(format!(
                            "{poles} poles need {} parameters, got {}",
                            2 + 2 * poles,
                            tokens.len()
                        )));
                    }
                    let mut delta_er = Vec::with_capacity(poles);
                    let mut tau = Vec::with_capacity(poles);
                    for pair in values[1..].chunks_exact(2) {
                        delta_er.push(number(pair[0])?);
                        tau.push(number(pair[1])?);
                    }
                    let material = materials
                        .iter_mut()
                        .find(|m| m.id == *id)
                        .ok_or_else(|| fail(format!("material '{id}' is not defined in this file")))?;
                    material.kind = "debye".to_string();
                    material.averagable = false;
                    material.dispersion = Some(DebyeDispersion { delta_er, tau });
                }
                other => return Err(fail(format!("unsupported command '{other}'"))),
            }
        }
        Ok(materials)
    }
}
