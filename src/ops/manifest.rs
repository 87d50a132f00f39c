//! Generate the package manager's `Package.swift` from dependency declarations.

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::core::declaration::{DeclarationError, Dependencies, PackageSource, Requirement};

/// Name of the generated package. Never shown to users.
const PACKAGE_NAME: &str = "PackageName";

/// Prefix of the product type hint lines appended to the manifest.
const PRODUCT_TYPES_MARKER: &str = "// quay:product-types";

static TOOLS_VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A//\s*swift-tools-version\s*:\s*[0-9]+(?:\.[0-9]+){0,2}[^\n]*(?:\n|\z)")
        .expect("tools-version pattern is valid")
});

/// Render `Package.swift` for `dependencies`.
///
/// Packages are sorted by identity, so the output is byte-identical for the
/// same declarations in any order. The tools-version line is only written
/// when `tools_version` is set.
pub fn build_manifest(
    dependencies: &Dependencies,
    tools_version: Option<&Version>,
) -> Result<String, DeclarationError> {
    let packages = dependencies.sorted_packages()?;
    let mut out = String::from("import PackageDescription\n\n");
    out.push_str("let package = Package(\n");
    out.push_str(&format!("    name: \"{}\",\n", PACKAGE_NAME));

    if packages.is_empty() {
        out.push_str("    dependencies: []\n");
    } else {
        out.push_str("    dependencies: [\n");
        for package in packages {
            let entry = package_entry(package.source(), package.requirement());
            out.push_str(&format!("        {},\n", entry));
        }
        out.push_str("    ]\n");
    }
    out.push_str(")\n");

    for (product, ty) in &dependencies.product_types {
        out.push_str(&format!("{} {}={}\n", PRODUCT_TYPES_MARKER, product, ty));
    }

    Ok(match tools_version {
        Some(version) => set_tools_version(&out, version),
        None => out,
    })
}

fn package_entry(source: &PackageSource, requirement: Option<&Requirement>) -> String {
    match (source, requirement) {
        (PackageSource::Local { path }, _) => {
            format!(".package(path: {})", quote(&path.display().to_string()))
        }
        (PackageSource::Remote { url }, Some(requirement)) => format!(
            ".package(url: {}, {})",
            quote(url.as_str()),
            render_requirement(requirement)
        ),
        (PackageSource::Remote { url }, None) => {
            format!(".package(url: {}, branch: \"main\")", quote(url.as_str()))
        }
    }
}

fn render_requirement(requirement: &Requirement) -> String {
    match requirement {
        Requirement::Exact(v) => format!(".exact({})", quote(&v.to_string())),
        Requirement::Range { from, to } => {
            format!("{}..<{}", quote(&from.to_string()), quote(&to.to_string()))
        }
        Requirement::UpToNextMajor(v) => format!(".upToNextMajor(from: {})", quote(&v.to_string())),
        Requirement::UpToNextMinor(v) => format!(".upToNextMinor(from: {})", quote(&v.to_string())),
        Requirement::Branch(b) => format!(".branch({})", quote(b)),
        Requirement::Revision(r) => format!(".revision({})", quote(r)),
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Short form used in manifests: `5.4`, or `5.4.2` when the patch is set.
pub fn format_tools_version(version: &Version) -> String {
    if version.patch == 0 {
        format!("{}.{}", version.major, version.minor)
    } else {
        format!("{}.{}.{}", version.major, version.minor, version.patch)
    }
}

fn tools_version_line(version: &Version) -> String {
    format!("// swift-tools-version:{}\n", format_tools_version(version))
}

/// Replace the tools-version line of `manifest`, or insert one.
pub fn set_tools_version(manifest: &str, version: &Version) -> String {
    let line = tools_version_line(version);
    match TOOLS_VERSION_LINE.find(manifest) {
        Some(m) => format!("{}{}", line, &manifest[m.end()..]),
        None => format!("{}{}", line, manifest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::declaration::PackageDeclaration;
    use crate::core::product::ProductType;
    use url::Url;

    fn remote(url: &str, requirement: Requirement) -> PackageDeclaration {
        PackageDeclaration::remote(Url::parse(url).unwrap(), requirement)
    }

    fn sample() -> Dependencies {
        let mut deps = Dependencies::default();
        deps.packages = vec![
            remote(
                "https://github.com/onevcat/Kingfisher",
                Requirement::Exact(Version::new(7, 1, 2)),
            ),
            remote(
                "https://github.com/Alamofire/Alamofire",
                Requirement::UpToNextMajor(Version::new(5, 0, 0)),
            ),
            PackageDeclaration::local("/work/LocalKit"),
        ];
        deps
    }

    #[test]
    fn test_manifest_layout() {
        let manifest = build_manifest(&sample(), Some(&Version::new(5, 4, 0))).unwrap();

        assert_eq!(
            manifest,
            r#"// swift-tools-version:5.4
import PackageDescription

let package = Package(
    name: "PackageName",
    dependencies: [
        .package(url: "https://github.com/Alamofire/Alamofire", .upToNextMajor(from: "5.0.0")),
        .package(url: "https://github.com/onevcat/Kingfisher", .exact("7.1.2")),
        .package(path: "/work/LocalKit"),
    ]
)
"#
        );
    }

    #[test]
    fn test_no_tools_version_line_without_version() {
        let manifest = build_manifest(&sample(), None).unwrap();
        assert!(manifest.starts_with("import PackageDescription\n"));
        assert!(!TOOLS_VERSION_LINE.is_match(&manifest));
    }

    #[test]
    fn test_requirement_rendering() {
        let cases = [
            (
                Requirement::Range {
                    from: Version::new(1, 0, 0),
                    to: Version::new(2, 0, 0),
                },
                r#""1.0.0"..<"2.0.0""#,
            ),
            (
                Requirement::UpToNextMinor(Version::new(1, 2, 0)),
                r#".upToNextMinor(from: "1.2.0")"#,
            ),
            (Requirement::Branch("main".into()), r#".branch("main")"#),
            (Requirement::Revision("abc".into()), r#".revision("abc")"#),
        ];

        for (requirement, expected) in cases {
            assert_eq!(render_requirement(&requirement), expected);
        }
    }

    #[test]
    fn test_manifest_is_order_independent() {
        let forward = sample();
        let mut reversed = sample();
        reversed.packages.reverse();

        assert_eq!(
            build_manifest(&forward, None).unwrap(),
            build_manifest(&reversed, None).unwrap()
        );
    }

    #[test]
    fn test_product_type_hints() {
        let mut deps = sample();
        deps.product_types.insert("Kingfisher".into(), ProductType::StaticLibrary);
        deps.product_types.insert("Alamofire".into(), ProductType::Framework);

        let manifest = build_manifest(&deps, None).unwrap();
        assert!(manifest.ends_with(
            ")\n// quay:product-types Alamofire=framework\n// quay:product-types Kingfisher=static-library\n"
        ));
    }

    #[test]
    fn test_empty_dependencies() {
        let manifest = build_manifest(&Dependencies::default(), None).unwrap();
        assert!(manifest.contains("    dependencies: []\n"));
    }

    #[test]
    fn test_duplicate_declarations() {
        let mut deps = sample();
        deps.packages.push(remote(
            "https://github.com/Alamofire/Alamofire",
            Requirement::UpToNextMajor(Version::new(5, 0, 0)),
        ));
        // Identical duplicate collapses
        assert_eq!(
            build_manifest(&deps, None).unwrap(),
            build_manifest(&sample(), None).unwrap()
        );

        deps.packages.push(remote(
            "https://github.com/Alamofire/Alamofire.git",
            Requirement::Exact(Version::new(5, 4, 0)),
        ));
        assert_eq!(
            build_manifest(&deps, None).unwrap_err(),
            DeclarationError::DuplicatePackageDeclaration {
                identity: "alamofire".into()
            }
        );
    }

    #[test]
    fn test_set_tools_version() {
        let manifest = "// swift-tools-version:5.3\nimport PackageDescription\n";
        let updated = set_tools_version(manifest, &Version::new(5, 5, 0));
        assert_eq!(updated, "// swift-tools-version:5.5\nimport PackageDescription\n");

        let inserted = set_tools_version("import PackageDescription\n", &Version::new(5, 4, 2));
        assert_eq!(
            inserted,
            "// swift-tools-version:5.4.2\nimport PackageDescription\n"
        );
    }
}
