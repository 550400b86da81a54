use crate::context::{ContextMapping, CONVENTIONAL_KEY};
use crate::errors::{Result, ScaffoldError};
use crate::render::Renderer;
use regex::RegexSet;
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const COPY_WITHOUT_RENDER: &str = "_copy_without_render";

/// Locate the project template inside a template root: the first directory
/// whose name is itself a template over `cookiecutter`.
pub fn find_template(repo_dir: &Path) -> Result<PathBuf> {
    let mut entries = fs::read_dir(repo_dir)
        .map_err(|e| ScaffoldError::io(repo_dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| ScaffoldError::io(repo_dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir && name.contains(CONVENTIONAL_KEY) && name.contains("{{") && name.contains("}}") {
            debug!(template = %name, "found project template");
            return Ok(entry.path());
        }
    }
    Err(ScaffoldError::NonTemplatedInputDir { path: repo_dir.to_path_buf() })
}

/// Render the project template found in `repo_dir` into `output_dir` and
/// return the generated project's path.
pub fn generate_files(
    renderer: &Renderer,
    repo_dir: &Path,
    context: &ContextMapping,
    output_dir: &Path,
    overwrite_if_exists: bool,
) -> Result<PathBuf> {
    let template_dir = find_template(repo_dir)?;
    let unrendered = template_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let project_name = renderer.render(&unrendered, &unrendered, context)?;
    if project_name.trim().is_empty() {
        return Err(ScaffoldError::InvalidContext(format!("`{unrendered}` renders to an empty directory name")));
    }
    let project_dir = output_dir.join(&project_name);
    let existed = project_dir.exists();
    if existed && !overwrite_if_exists {
        return Err(ScaffoldError::OutputDirExists { path: project_dir });
    }
    fs::create_dir_all(&project_dir).map_err(|e| ScaffoldError::io(&project_dir, e))?;
    info!(project = %project_dir.display(), "generating project");

    let result = render_tree(renderer, &template_dir, &unrendered, context, &project_dir);
    if let Err(e) = result {
        // Only clean up what this run created; an overwritten project stays.
        if !existed {
            debug!(project = %project_dir.display(), "removing partially generated project");
            if let Err(cleanup) = fs::remove_dir_all(&project_dir) {
                warn!(project = %project_dir.display(), error = %cleanup, "failed to remove partial project");
            }
        }
        return Err(e);
    }
    Ok(project_dir)
}

fn render_tree(
    renderer: &Renderer,
    template_dir: &Path,
    unrendered: &str,
    context: &ContextMapping,
    project_dir: &Path,
) -> Result<()> {
    let verbatim = copy_without_render_patterns(context)?;

    for entry in WalkDir::new(template_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| template_dir.to_path_buf());
            ScaffoldError::io(path, e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(template_dir)
            .map_err(|_| ScaffoldError::InvalidContext(format!("{} escapes the template", entry.path().display())))?;
        let parts = path_parts(rel);
        let rel_name = parts.join("/");
        let glob_path = format!("{unrendered}/{rel_name}");

        // Below a copied-verbatim directory, names are left as written.
        let literal_from = verbatim
            .as_ref()
            .and_then(|set| copied_ancestor_depth(set, &glob_path))
            .unwrap_or(parts.len());

        let Some(dest_rel) = render_parts(renderer, &rel_name, &parts, literal_from, context)? else {
            debug!(path = %rel_name, "skipping entry whose name renders empty");
            continue;
        };
        let dest = project_dir.join(dest_rel);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| ScaffoldError::io(&dest, e))?;
        } else if file_type.is_file() {
            let copy_only = verbatim.as_ref().is_some_and(|set| matches_path_or_parent(set, &glob_path));
            write_file(renderer, entry.path(), &dest, &rel_name, context, copy_only)?;
        } else {
            debug!(path = %rel_name, "skipping non-regular file");
        }
    }
    Ok(())
}

fn write_file(
    renderer: &Renderer,
    src: &Path,
    dest: &Path,
    name: &str,
    context: &ContextMapping,
    copy_only: bool,
) -> Result<()> {
    let bytes = fs::read(src).map_err(|e| ScaffoldError::io(src, e))?;
    let body = match (copy_only, String::from_utf8(bytes)) {
        (false, Ok(text)) => {
            debug!(file = %name, "rendering");
            renderer.render(name, &text, context)?.into_bytes()
        }
        (_, Ok(text)) => {
            debug!(file = %name, "copying without render");
            text.into_bytes()
        }
        (_, Err(not_utf8)) => {
            debug!(file = %name, "copying binary file");
            not_utf8.into_bytes()
        }
    };
    fs::write(dest, body).map_err(|e| ScaffoldError::io(dest, e))?;

    let perms = fs::metadata(src).map_err(|e| ScaffoldError::io(src, e))?.permissions();
    fs::set_permissions(dest, perms).map_err(|e| ScaffoldError::io(dest, e))
}

fn path_parts(rel: &Path) -> Vec<String> {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Render each path component before `literal_from`; `None` if any of them
/// renders empty.
fn render_parts(
    renderer: &Renderer,
    rel_name: &str,
    parts: &[String],
    literal_from: usize,
    context: &ContextMapping,
) -> Result<Option<PathBuf>> {
    let mut out = PathBuf::new();
    for (i, part) in parts.iter().enumerate() {
        if i >= literal_from {
            out.push(part);
            continue;
        }
        let rendered = renderer.render(rel_name, part, context)?;
        if rendered.is_empty() {
            return Ok(None);
        }
        out.push(rendered);
    }
    Ok(Some(out))
}

fn copy_without_render_patterns(context: &ContextMapping) -> Result<Option<RegexSet>> {
    let patterns = context
        .get(CONVENTIONAL_KEY)
        .and_then(|c| c.get(COPY_WITHOUT_RENDER))
        .and_then(Value::as_array);
    let Some(patterns) = patterns else {
        return Ok(None);
    };

    let regexes = patterns
        .iter()
        .filter_map(Value::as_str)
        .map(glob_to_regex)
        .collect::<Vec<_>>();
    RegexSet::new(&regexes)
        .map(Some)
        .map_err(|e| ScaffoldError::InvalidContext(format!("bad {COPY_WITHOUT_RENDER} pattern: {e}")))
}

/// Shell-style wildcard to anchored regex. `*` crosses `/`, as in fnmatch.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut class = String::new();
                if chars.peek() == Some(&'!') {
                    chars.next();
                    class.push('^');
                }
                let mut closed = false;
                for cc in chars.by_ref() {
                    if cc == ']' {
                        closed = true;
                        break;
                    }
                    if cc == '\\' {
                        class.push('\\');
                    }
                    class.push(cc);
                }
                if closed {
                    out.push('[');
                    out.push_str(&class);
                    out.push(']');
                } else {
                    out.push_str(&regex::escape(&format!("[{class}")));
                }
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

/// Index into the template-relative parts of `glob_path` from which names are
/// copied literally: everything below the outermost matching ancestor
/// directory. The project directory itself counts as an ancestor.
fn copied_ancestor_depth(set: &RegexSet, glob_path: &str) -> Option<usize> {
    let parts: Vec<&str> = glob_path.split('/').collect();
    (1..parts.len())
        .find(|&n| set.is_match(&parts[..n].join("/")))
        .map(|n| n - 1)
}

fn matches_path_or_parent(set: &RegexSet, glob_path: &str) -> bool {
    let parts: Vec<&str> = glob_path.split('/').collect();
    (1..=parts.len()).any(|n| set.is_match(&parts[..n].join("/")))
}
