//! Product types - what kind of artifact a target or package product builds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The build output kind of a target or an external package product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductType {
    /// Application bundle
    App,

    /// Static library (.a)
    #[serde(alias = "static")]
    StaticLibrary,

    /// Dynamic library (.dylib)
    #[serde(alias = "dynamic")]
    DynamicLibrary,

    /// Dynamic framework
    Framework,

    /// Static framework
    StaticFramework,

    /// Command line tool
    #[serde(alias = "command-line-tool")]
    Executable,

    /// Unit test bundle
    #[serde(alias = "unit-test")]
    UnitTests,

    /// UI test bundle
    #[serde(alias = "ui-test")]
    UiTests,

    /// Resource bundle
    Bundle,
}

impl Default for ProductType {
    fn default() -> Self {
        ProductType::App
    }
}

impl ProductType {
    /// Check if this product is a test bundle.
    pub fn is_test(&self) -> bool {
        matches!(self, ProductType::UnitTests | ProductType::UiTests)
    }

    /// The kebab-case name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::App => "app",
            ProductType::StaticLibrary => "static-library",
            ProductType::DynamicLibrary => "dynamic-library",
            ProductType::Framework => "framework",
            ProductType::StaticFramework => "static-framework",
            ProductType::Executable => "executable",
            ProductType::UnitTests => "unit-tests",
            ProductType::UiTests => "ui-tests",
            ProductType::Bundle => "bundle",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
