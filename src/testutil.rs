//! Shared metadata fixtures for unit tests: a small corpus of targets with
//! one declared condition each, mirroring the licenses the policy rules
//! distinguish.

use crate::graph::LicenseGraph;
use crate::loader::read_license_graph;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns the metadata text for a named fixture target, without deps.
pub fn meta_fixture(name: &str) -> &'static str {
    match name {
        "apacheBin" => {
            "package_name: \"Apache\"\n\
             module_classes: \"EXECUTABLES\"\n\
             projects: \"standalone/apache\"\n\
             license_kinds: \"SPDX-license-identifier-Apache-2.0\"\n\
             license_conditions: \"notice\"\n\
             license_texts: \"standalone/apache/LICENSE\"\n\
             built: \"out/bin/apacheBin\"\n\
             installed: \"out/system/bin/apacheBin\"\n"
        }
        "apacheLib" => {
            "package_name: \"Android\"\n\
             module_classes: \"SHARED_LIBRARIES\"\n\
             projects: \"device/library\"\n\
             license_kinds: \"SPDX-license-identifier-Apache-2.0\"\n\
             license_conditions: \"notice\"\n\
             license_texts: \"device/library/LICENSE\"\n\
             built: \"out/lib/libapache.so\"\n\
             installed: \"out/system/lib/libapache.so\"\n"
        }
        "apacheContainer" => {
            "package_name: \"Apache\"\n\
             projects: \"container/apache\"\n\
             license_kinds: \"SPDX-license-identifier-Apache-2.0\"\n\
             license_conditions: \"notice\"\n\
             license_texts: \"container/apache/LICENSE\"\n\
             is_container: true\n\
             built: \"out/container.zip\"\n\
             installed: \"out/system/container.zip\"\n\
             install_map {\n  from_path: \"out/system/\"\n  container_path: \"/\"\n}\n\
             sources: \"out/system/bin/apacheBin\"\n\
             sources: \"out/system/lib/libapache.so\"\n"
        }
        "mitBin" => {
            "package_name: \"MIT\"\n\
             projects: \"static/mit\"\n\
             license_kinds: \"SPDX-license-identifier-MIT\"\n\
             license_conditions: \"notice\"\n\
             license_texts: \"static/mit/LICENSE\"\n\
             built: \"out/bin/mitBin\"\n\
             installed: \"out/system/bin/mitBin\"\n"
        }
        "mitLib" => {
            "package_name: \"MIT\"\n\
             projects: \"static/mit\"\n\
             license_kinds: \"SPDX-license-identifier-MIT\"\n\
             license_conditions: \"notice\"\n\
             license_texts: \"static/mit/LICENSE\"\n\
             built: \"out/lib/libmit.so\"\n\
             installed: \"out/system/lib/libmit.so\"\n"
        }
        "gplBin" => {
            "package_name: \"GPL\"\n\
             projects: \"dynamic/gpl\"\n\
             license_kinds: \"SPDX-license-identifier-GPL-2.0\"\n\
             license_conditions: \"restricted\"\n\
             license_texts: \"dynamic/gpl/LICENSE\"\n\
             built: \"out/bin/gplBin\"\n\
             installed: \"out/system/bin/gplBin\"\n"
        }
        "gplLib" => {
            "package_name: \"GPL\"\n\
             projects: \"dynamic/gpl\"\n\
             license_kinds: \"SPDX-license-identifier-GPL-2.0\"\n\
             license_conditions: \"restricted\"\n\
             license_texts: \"dynamic/gpl/LICENSE\"\n\
             built: \"out/lib/libgpl.so\"\n\
             installed: \"out/system/lib/libgpl.so\"\n"
        }
        "gplContainer" => {
            "package_name: \"GPL\"\n\
             projects: \"dynamic/gpl\"\n\
             license_kinds: \"SPDX-license-identifier-GPL-2.0\"\n\
             license_conditions: \"restricted\"\n\
             license_texts: \"dynamic/gpl/LICENSE\"\n\
             is_container: true\n\
             built: \"out/gplContainer.zip\"\n\
             installed: \"out/system/gplContainer.zip\"\n"
        }
        "lgplBin" => {
            "package_name: \"LGPL\"\n\
             projects: \"dynamic/lgpl\"\n\
             license_kinds: \"SPDX-license-identifier-LGPL-2.1\"\n\
             license_conditions: \"restricted_allows_dynamic_linking\"\n\
             license_texts: \"dynamic/lgpl/LICENSE\"\n\
             built: \"out/bin/lgplBin\"\n\
             installed: \"out/system/bin/lgplBin\"\n"
        }
        "lgplLib" => {
            "package_name: \"LGPL\"\n\
             projects: \"dynamic/lgpl\"\n\
             license_kinds: \"SPDX-license-identifier-LGPL-2.1\"\n\
             license_conditions: \"restricted_allows_dynamic_linking\"\n\
             license_texts: \"dynamic/lgpl/LICENSE\"\n\
             built: \"out/lib/liblgpl.so\"\n\
             installed: \"out/system/lib/liblgpl.so\"\n"
        }
        "gplWithClasspathException" => {
            "package_name: \"GPL with classpath exception\"\n\
             projects: \"dynamic/binary\"\n\
             license_kinds: \"SPDX-license-identifier-GPL-2.0-with-classpath-exception\"\n\
             license_conditions: \"restricted_with_classpath_exception\"\n\
             license_texts: \"dynamic/binary/LICENSE\"\n\
             built: \"out/lib/libcpe.jar\"\n\
             installed: \"out/system/framework/libcpe.jar\"\n"
        }
        "dependentModule" => {
            "package_name: \"Free Software\"\n\
             projects: \"dynamic/dependent\"\n\
             license_kinds: \"SPDX-license-identifier-MIT\"\n\
             license_conditions: \"notice\"\n\
             license_texts: \"dynamic/dependent/LICENSE\"\n\
             is_dependent_module: true\n\
             built: \"out/lib/libdependent.jar\"\n\
             installed: \"out/system/framework/libdependent.jar\"\n"
        }
        "mplBin" => {
            "package_name: \"MPL\"\n\
             projects: \"reciprocal/mpl\"\n\
             license_kinds: \"SPDX-license-identifier-MPL-2.0\"\n\
             license_conditions: \"reciprocal\"\n\
             license_texts: \"reciprocal/mpl/LICENSE\"\n\
             built: \"out/bin/mplBin\"\n\
             installed: \"out/system/bin/mplBin\"\n"
        }
        "mplLib" => {
            "package_name: \"MPL\"\n\
             projects: \"reciprocal/mpl\"\n\
             license_kinds: \"SPDX-license-identifier-MPL-2.0\"\n\
             license_conditions: \"reciprocal\"\n\
             license_texts: \"reciprocal/mpl/LICENSE\"\n\
             built: \"out/lib/libmpl.so\"\n\
             installed: \"out/system/lib/libmpl.so\"\n"
        }
        "proprietary" => {
            "package_name: \"Proprietary\"\n\
             projects: \"proprietary/vendor\"\n\
             license_kinds: \"legacy_proprietary\"\n\
             license_conditions: \"proprietary\"\n\
             license_texts: \"proprietary/vendor/LICENSE\"\n\
             built: \"out/bin/proprietary\"\n\
             installed: \"out/system/bin/proprietary\"\n"
        }
        "by_exception" => {
            "package_name: \"Exceptional\"\n\
             projects: \"exception/vendor\"\n\
             license_kinds: \"legacy_by_exception_only\"\n\
             license_conditions: \"by_exception_only\"\n\
             license_texts: \"exception/vendor/LICENSE\"\n\
             built: \"out/lib/libexception.so\"\n\
             installed: \"out/system/lib/libexception.so\"\n"
        }
        other => panic!("no metadata fixture named {other:?}"),
    }
}

/// Writes `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// The fixture metadata for `name` with `deps` blocks appended.
pub fn meta_with_deps(name: &str, deps: &[(&str, &[&str])]) -> String {
    let mut meta = meta_fixture(name).to_string();
    for (dep, annotations) in deps {
        meta.push_str(&format!("deps: {{\n  file: \"{dep}.meta_lic\"\n"));
        for ann in *annotations {
            meta.push_str(&format!("  annotations: \"{ann}\"\n"));
        }
        meta.push_str("}\n");
    }
    meta
}

/// Writes the given targets (first entry is the root) into a temp dir and
/// loads the graph from it.
pub fn build_graph(targets: &[(&str, &[(&str, &[&str])])]) -> (LicenseGraph, TempDir) {
    let tmp = TempDir::new().unwrap();
    for (name, deps) in targets {
        write_file(tmp.path(), &format!("{name}.meta_lic"), &meta_with_deps(name, deps));
    }
    let root = format!("{}.meta_lic", targets[0].0);
    let lg = read_license_graph(tmp.path(), &[root]).unwrap();
    (lg, tmp)
}
