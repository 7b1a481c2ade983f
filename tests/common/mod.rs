//! Shared fixtures for the CLI integration tests: a small corpus of license
//! metadata written into a temp dir, driven through the `lichen` binary.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Writes `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Metadata for a binary target with the given license condition.
pub fn bin_meta(name: &str, package: &str, condition: &str, deps: &[(&str, &str)]) -> String {
    let mut meta = format!(
        "package_name: \"{package}\"\n\
         projects: \"project/{name}\"\n\
         license_conditions: \"{condition}\"\n\
         license_texts: \"project/{name}/LICENSE\"\n\
         built: \"out/bin/{name}\"\n\
         installed: \"out/system/bin/{name}\"\n"
    );
    push_deps(&mut meta, deps);
    meta
}

/// Metadata for a library target with the given license condition.
pub fn lib_meta(name: &str, package: &str, condition: &str, deps: &[(&str, &str)]) -> String {
    let mut meta = format!(
        "package_name: \"{package}\"\n\
         projects: \"project/{name}\"\n\
         license_conditions: \"{condition}\"\n\
         license_texts: \"project/{name}/LICENSE\"\n\
         built: \"out/lib/{name}.so\"\n\
         installed: \"out/system/lib/{name}.so\"\n"
    );
    push_deps(&mut meta, deps);
    meta
}

fn push_deps(meta: &mut String, deps: &[(&str, &str)]) {
    for (dep, annotation) in deps {
        meta.push_str(&format!(
            "deps: {{\n  file: \"{dep}.meta_lic\"\n  annotations: \"{annotation}\"\n}}\n"
        ));
    }
}

/// Writes a two-binaries-share-one-library tree:
/// `binA` and `binB` statically link `shared` (permissive notice license);
/// every target has a license text on disk.
pub fn write_shared_lib_corpus(dir: &Path) {
    write_file(dir, "binA.meta_lic", &bin_meta("binA", "Alpha", "notice", &[("shared", "static")]));
    write_file(dir, "binB.meta_lic", &bin_meta("binB", "Beta", "notice", &[("shared", "static")]));
    write_file(dir, "shared.meta_lic", &lib_meta("shared", "Shared", "permissive", &[]));
    write_file(dir, "project/binA/LICENSE", "alpha license text\n");
    write_file(dir, "project/binB/LICENSE", "beta license text\n");
    write_file(dir, "project/shared/LICENSE", "shared permissive license text\n");
}

/// Writes a first-party binary over a GPL library:
/// `gplBin` (restricted) statically links `apacheLib` (notice).
pub fn write_restricted_corpus(dir: &Path) {
    write_file(
        dir,
        "gplBin.meta_lic",
        &bin_meta("gplBin", "GPL", "restricted", &[("apacheLib", "static")]),
    );
    write_file(dir, "apacheLib.meta_lic", &lib_meta("apacheLib", "Apache", "notice", &[]));
    write_file(dir, "project/gplBin/LICENSE", "gpl license text\n");
    write_file(dir, "project/apacheLib/LICENSE", "apache license text\n");
}
