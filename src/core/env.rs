//! Job environment resolution and command templating

use std::collections::BTreeMap;

/// Environment variable injected with the matrix entry name
pub const JOB_NAME_VAR: &str = "JOB_NAME";

/// Environment variable injected with the matrix entry tag
pub const JOB_TAG_VAR: &str = "JOB_TAG";

/// Resolve the environment for one job.
///
/// Later sources win: global env, then entry env, then the injected
/// `JOB_NAME`/`JOB_TAG` pair. CLI overrides are layered on afterwards by the
/// caller via [`apply_overrides`].
pub fn resolve_env(
    global: &BTreeMap<String, String>,
    entry: &BTreeMap<String, String>,
    name: &str,
    tag: &str,
) -> BTreeMap<String, String> {
    let mut env = global.clone();
    for (key, value) in entry {
        env.insert(key.clone(), value.clone());
    }
    env.insert(JOB_NAME_VAR.to_string(), name.to_string());
    env.insert(JOB_TAG_VAR.to_string(), tag.to_string());
    env
}

/// Layer key=value overrides over a resolved environment
pub fn apply_overrides(env: &mut BTreeMap<String, String>, overrides: &[(String, String)]) {
    for (key, value) in overrides {
        env.insert(key.clone(), value.clone());
    }
}

/// Render `{{ placeholder }}` references in a command template.
///
/// `{{ name }}` and `{{ tag }}` resolve to the job name and tag; `{{ KEY }}`
/// resolves to any key of the job env. Unknown placeholders are left intact
/// so the shell can report them. `$VAR` interpolation is the shell's job at
/// execution time, not ours.
pub fn render_command(
    template: &str,
    name: &str,
    tag: &str,
    env: &BTreeMap<String, String>,
) -> String {
    let mut command = template.to_string();

    command = command.replace("{{ name }}", name);
    command = command.replace("{{ tag }}", tag);

    for (key, value) in env {
        let placeholder = format!("{{{{ {} }}}}", key);
        command = command.replace(&placeholder, value);
    }

    command
}
