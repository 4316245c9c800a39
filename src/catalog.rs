//! Fixed detection catalogs for each product family.
//!
//! A [`Catalog`] is pure data: the identifiers, registry locations and match
//! predicates the detector evaluates. Keeping them here means a new SKU is a
//! one-line change and the heuristics themselves never grow special cases.

/// Uninstall namespaces, native view first.
pub const UNINSTALL_ROOTS: &[&str] = &[
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
    r"HKLM\SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
];

/// Click-to-run configuration node.
pub const CLICK_TO_RUN_CONFIG: &str = r"HKLM\SOFTWARE\Microsoft\Office\ClickToRun\Configuration";

/// Application path registrations.
pub const APP_PATHS_ROOT: &str = r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\App Paths";

/// Language tags appended by the installer to localized product keys.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    "en-us", "en-gb", "de-de", "fr-fr", "es-es", "it-it", "nl-nl", "pt-br", "pt-pt", "sv-se",
    "da-dk", "fi-fi", "nb-no", "pl-pl", "cs-cz", "ru-ru", "tr-tr", "ja-jp", "ko-kr", "zh-cn",
    "zh-tw",
];

/// Which click-to-run release ids a catalog claims.
#[derive(Debug, Clone, Copy)]
pub enum ReleaseFilter {
    /// Only ids listed in the catalog's `product_ids`.
    Listed,
    /// Ids containing any of these fragments (case-insensitive).
    Containing(&'static [&'static str]),
    /// Any id that contains none of these fragments (case-insensitive).
    Excluding(&'static [&'static str]),
}

impl ReleaseFilter {
    /// Whether `release_id` belongs to a catalog with the given product ids.
    pub fn accepts(&self, release_id: &str, product_ids: &[&str]) -> bool {
        let id = release_id.to_ascii_lowercase();
        match self {
            Self::Listed => product_ids.iter().any(|p| p.eq_ignore_ascii_case(release_id)),
            Self::Containing(fragments) => fragments
                .iter()
                .any(|f| id.contains(&f.to_ascii_lowercase())),
            Self::Excluding(fragments) => !fragments
                .iter()
                .any(|f| id.contains(&f.to_ascii_lowercase())),
        }
    }
}

/// A legacy major-version install root.
#[derive(Debug, Clone, Copy)]
pub struct InstallRoot {
    /// Major version label, e.g. `16.0`.
    pub version: &'static str,
    /// Registry key holding the root.
    pub key: &'static str,
    /// Value under `key` naming the install directory.
    pub value: &'static str,
}

/// Field of a normalized uninstall entry a [`MatchRule`] inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    DisplayName,
    UninstallCommand,
    KeyName,
}

/// A wildcard predicate (`*` matches any run of characters, case-insensitive).
#[derive(Debug, Clone, Copy)]
pub struct MatchRule {
    pub field: MatchField,
    pub pattern: &'static str,
}

impl MatchRule {
    pub const fn display_name(pattern: &'static str) -> Self {
        Self {
            field: MatchField::DisplayName,
            pattern,
        }
    }

    pub const fn uninstall_command(pattern: &'static str) -> Self {
        Self {
            field: MatchField::UninstallCommand,
            pattern,
        }
    }

    pub const fn key_name(pattern: &'static str) -> Self {
        Self {
            field: MatchField::KeyName,
            pattern,
        }
    }
}

/// Include/exclude predicates for the generic uninstall scan.
///
/// An entry matches when any include rule matches and no exclude rule does.
#[derive(Debug, Clone, Copy)]
pub struct ScanRules {
    pub include: &'static [MatchRule],
    pub exclude: &'static [MatchRule],
}

/// Store package selection for the consumer catalog.
#[derive(Debug, Clone, Copy)]
pub struct StorePackageRule {
    /// Package name patterns in the suite's namespace.
    pub include: &'static [&'static str],
    /// Package name patterns that are never consumer packages.
    pub exclude: &'static [&'static str],
}

/// Everything the detector needs to know about one product family.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    /// Short name used in log fields.
    pub name: &'static str,
    pub product_ids: &'static [&'static str],
    pub release_filter: ReleaseFilter,
    /// Executable names registered under [`APP_PATHS_ROOT`].
    pub app_paths: &'static [&'static str],
    pub install_roots: &'static [InstallRoot],
    pub scan: ScanRules,
    pub store_packages: Option<StorePackageRule>,
}

/// Display-name fragments that mark a consumer SKU.
const CONSUMER_MARKERS: &[MatchRule] = &[
    MatchRule::display_name("*Home*"),
    MatchRule::display_name("*Personal*"),
    MatchRule::display_name("*Family*"),
    MatchRule::display_name("*Student*"),
    MatchRule::key_name("*Home*"),
    MatchRule::key_name("Personal*"),
];

pub static SUITE: Catalog = Catalog {
    name: "suite",
    product_ids: &[
        "O365ProPlusRetail",
        "O365ProPlusEEANoTeamsRetail",
        "O365BusinessRetail",
        "O365BusinessEEANoTeamsRetail",
        "ProPlusRetail",
        "ProPlus2019Retail",
        "ProPlus2021Retail",
        "ProPlus2024Retail",
        "ProPlus2019Volume",
        "ProPlus2021Volume",
        "ProPlus2024Volume",
        "Standard2019Volume",
        "Standard2021Volume",
        "Standard2024Volume",
        "Office16.PROPLUS",
        "Office15.PROPLUS",
        "Office14.PROPLUS",
        "Office16.STANDARD",
        "Office15.STANDARD",
    ],
    release_filter: ReleaseFilter::Excluding(&["Visio", "Project", "Home", "Personal", "Language"]),
    app_paths: &[
        "WINWORD.EXE",
        "EXCEL.EXE",
        "POWERPNT.EXE",
        "OUTLOOK.EXE",
        "MSACCESS.EXE",
    ],
    install_roots: &[
        InstallRoot {
            version: "16.0",
            key: r"HKLM\SOFTWARE\Microsoft\Office\16.0\Common\InstallRoot",
            value: "Path",
        },
        InstallRoot {
            version: "15.0",
            key: r"HKLM\SOFTWARE\Microsoft\Office\15.0\Common\InstallRoot",
            value: "Path",
        },
        InstallRoot {
            version: "14.0",
            key: r"HKLM\SOFTWARE\Microsoft\Office\14.0\Common\InstallRoot",
            value: "Path",
        },
    ],
    scan: ScanRules {
        include: &[
            MatchRule::display_name("Microsoft Office*"),
            MatchRule::display_name("Microsoft 365*"),
            MatchRule::display_name("Office 16 Click-to-Run*"),
            MatchRule::uninstall_command("*OfficeClickToRun.exe*"),
            MatchRule::key_name("O365*"),
            MatchRule::key_name("ProPlus*"),
        ],
        exclude: &[
            MatchRule::display_name("*Visio*"),
            MatchRule::display_name("*Project*"),
            MatchRule::display_name("*Home*"),
            MatchRule::display_name("*Personal*"),
            MatchRule::display_name("*Family*"),
            MatchRule::display_name("*Student*"),
            MatchRule::display_name("*Language*"),
            MatchRule::display_name("*Proofing*"),
            MatchRule::key_name("*Visio*"),
            MatchRule::key_name("*Project*"),
            MatchRule::key_name("*Home*"),
            MatchRule::key_name("Personal*"),
        ],
    },
    store_packages: None,
};

pub static VISIO: Catalog = Catalog {
    name: "visio",
    product_ids: &[
        "VisioProRetail",
        "VisioStdRetail",
        "VisioPro2019Retail",
        "VisioStd2019Retail",
        "VisioPro2019Volume",
        "VisioStd2019Volume",
        "VisioPro2021Volume",
        "VisioStd2021Volume",
        "VisioPro2024Volume",
        "VisioStd2024Volume",
        "Office16.VISIO",
        "Office15.VISIO",
    ],
    release_filter: ReleaseFilter::Containing(&["Visio"]),
    app_paths: &["VISIO.EXE"],
    install_roots: &[],
    scan: ScanRules {
        include: &[
            MatchRule::display_name("*Visio*"),
            MatchRule::key_name("Visio*"),
        ],
        exclude: &[
            MatchRule::display_name("*Viewer*"),
            MatchRule::display_name("*Language*"),
        ],
    },
    store_packages: None,
};

pub static PROJECT: Catalog = Catalog {
    name: "project",
    product_ids: &[
        "ProjectProRetail",
        "ProjectStdRetail",
        "ProjectPro2019Retail",
        "ProjectStd2019Retail",
        "ProjectPro2019Volume",
        "ProjectStd2019Volume",
        "ProjectPro2021Volume",
        "ProjectStd2021Volume",
        "ProjectPro2024Volume",
        "ProjectStd2024Volume",
        "Office16.PRJPRO",
        "Office15.PRJPRO",
    ],
    release_filter: ReleaseFilter::Containing(&["Project"]),
    app_paths: &["WINPROJ.EXE"],
    install_roots: &[],
    scan: ScanRules {
        include: &[
            MatchRule::display_name("Microsoft Project*"),
            MatchRule::display_name("Microsoft Office Project*"),
            MatchRule::key_name("Project*"),
        ],
        exclude: &[MatchRule::display_name("*Language*")],
    },
    store_packages: None,
};

/// Home, personal and OEM-bundled SKUs.
pub static CONSUMER: Catalog = Catalog {
    name: "consumer",
    product_ids: &[
        "O365HomePremRetail",
        "O365PersonalRetail",
        "HomeStudentRetail",
        "HomeBusinessRetail",
        "HomeStudent2019Retail",
        "HomeBusiness2019Retail",
        "HomeStudent2021Retail",
        "HomeBusiness2021Retail",
        "HomeStudent2024Retail",
        "HomeBusiness2024Retail",
        "PersonalRetail",
        "Personal2019Retail",
        "Personal2021Retail",
    ],
    release_filter: ReleaseFilter::Listed,
    app_paths: &[],
    install_roots: &[],
    scan: ScanRules {
        include: &[
            MatchRule::display_name("*Office*Home*"),
            MatchRule::display_name("*Office*Personal*"),
            MatchRule::display_name("Microsoft 365 Family*"),
            MatchRule::display_name("Microsoft 365 Personal*"),
            MatchRule::display_name("*Office*OEM*"),
            MatchRule::key_name("O365Home*"),
            MatchRule::key_name("Home*Retail*"),
            MatchRule::key_name("Personal*Retail*"),
        ],
        exclude: &[MatchRule::display_name("*Language*")],
    },
    store_packages: Some(StorePackageRule {
        include: &["Microsoft.Office.*", "Microsoft.MicrosoftOfficeHub"],
        exclude: &["*Desktop*"],
    }),
};

/// Rules that classify an already-detected product as consumer.
pub fn consumer_markers() -> &'static [MatchRule] {
    CONSUMER_MARKERS
}
