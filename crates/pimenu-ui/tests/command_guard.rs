use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(dir: &Path, out: &mut Vec<PathBuf>) {
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_rs_files(&path, out);
            } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
}

#[test]
fn external_commands_only_run_from_system_module() {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let src_dir = manifest_dir.join("src");
    let allowed = src_dir.join("system.rs");
    let mut files = Vec::new();
    collect_rs_files(&src_dir, &mut files);
    assert!(files.contains(&allowed), "system.rs missing from {src_dir:?}");

    let mut offenders = Vec::new();
    for file in files {
        if file == allowed {
            continue;
        }
        let content = fs::read_to_string(&file).unwrap_or_else(|_| String::new());
        if content.contains("Command::new") || content.contains("process::Command") {
            offenders.push(file);
        }
    }

    assert!(
        offenders.is_empty(),
        "Menu screens must go through SystemActionExecutor. Offenders: {offenders:?}"
    );
}
