// src/core/signatures.rs

//! The static signature registry: one ordered rule table per detection
//! category. Declaration order is significant — it is the tie-break order
//! when two candidates accumulate equal scores — so rules live in plain
//! slices and `Vec`s, never in maps.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// One detectable candidate within a category: the body regexes, header
/// name tokens, cookie substring tokens and well-known paths (CMS only)
/// that identify it. Compiled once at first use and immutable afterwards.
pub struct SignatureRule {
    pub name: &'static str,
    pub body_patterns: Vec<Regex>,
    pub header_tokens: &'static [&'static str],
    pub cookie_tokens: &'static [&'static str],
    pub paths: &'static [&'static str],
}

// The declarative form a rule is written in. Regexes are compiled out of
// this by `compile_rules` on first access of the category table.
struct RuleSpec {
    name: &'static str,
    body_patterns: &'static [&'static str],
    header_tokens: &'static [&'static str],
    cookie_tokens: &'static [&'static str],
    paths: &'static [&'static str],
}

impl RuleSpec {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            body_patterns: &[],
            header_tokens: &[],
            cookie_tokens: &[],
            paths: &[],
        }
    }
}

/// Compiles a spec table into its runtime form, preserving declaration
/// order. All matching is case-insensitive. A pattern that fails to
/// compile is dropped with a warning and simply never matches.
fn compile_rules(specs: &[RuleSpec]) -> Vec<SignatureRule> {
    specs
        .iter()
        .map(|spec| SignatureRule {
            name: spec.name,
            body_patterns: spec
                .body_patterns
                .iter()
                .filter_map(|pattern| {
                    match RegexBuilder::new(pattern).case_insensitive(true).build() {
                        Ok(re) => Some(re),
                        Err(e) => {
                            warn!(rule = spec.name, pattern, error = %e, "Dropping unparsable body pattern.");
                            None
                        }
                    }
                })
                .collect(),
            header_tokens: spec.header_tokens,
            cookie_tokens: spec.cookie_tokens,
            paths: spec.paths,
        })
        .collect()
}

// --- CMS Signatures ---

const CMS_SPECS: &[RuleSpec] = &[
    RuleSpec {
        body_patterns: &[
            r"wp-content",
            r"wp-includes",
            r"wp-admin",
            r#"<meta name="generator" content="WordPress\s*([\d.]+)?"#,
        ],
        cookie_tokens: &["wordpress_"],
        paths: &["/wp-login.php", "/wp-admin/"],
        ..RuleSpec::new("wordpress")
    },
    RuleSpec {
        body_patterns: &[
            r"/components/com_",
            r"/media/jui/",
            r#"<meta name="generator" content="Joomla!?\s*([\d.]+)?"#,
        ],
        paths: &["/administrator/"],
        ..RuleSpec::new("joomla")
    },
    RuleSpec {
        body_patterns: &[
            r"Drupal",
            r"/sites/default/",
            r"/sites/all/",
            r#"<meta name="Generator" content="Drupal\s*([\d.]+)?"#,
        ],
        header_tokens: &["X-Drupal-Cache", "X-Generator: Drupal"],
        cookie_tokens: &["SESS"],
        paths: &["/user/login"],
        ..RuleSpec::new("drupal")
    },
    RuleSpec {
        body_patterns: &[r"/skin/frontend/", r"Mage.Cookies", r"varien/js"],
        cookie_tokens: &["frontend"],
        paths: &["/admin"],
        ..RuleSpec::new("magento")
    },
    RuleSpec {
        body_patterns: &[r"cdn.shopify.com", r"shopify", r"Shopify.theme"],
        header_tokens: &["X-ShopId"],
        cookie_tokens: &["_shopify"],
        ..RuleSpec::new("shopify")
    },
];

pub static CMS_RULES: Lazy<Vec<SignatureRule>> = Lazy::new(|| compile_rules(CMS_SPECS));

// --- Backend Framework Signatures ---

const BACKEND_FRAMEWORK_SPECS: &[RuleSpec] = &[
    RuleSpec {
        body_patterns: &[r"laravel", r"Laravel"],
        header_tokens: &["X-Laravel"],
        cookie_tokens: &["laravel_session", "XSRF-TOKEN"],
        ..RuleSpec::new("laravel")
    },
    RuleSpec {
        body_patterns: &[r"csrfmiddlewaretoken", r"__admin"],
        cookie_tokens: &["csrftoken", "sessionid"],
        ..RuleSpec::new("django")
    },
    RuleSpec {
        body_patterns: &[r"Werkzeug"],
        header_tokens: &["Server: Werkzeug"],
        cookie_tokens: &["session"],
        ..RuleSpec::new("flask")
    },
    RuleSpec {
        header_tokens: &["X-Powered-By: Express"],
        cookie_tokens: &["connect.sid"],
        ..RuleSpec::new("express")
    },
    RuleSpec {
        body_patterns: &[r"Whitelabel Error Page"],
        cookie_tokens: &["JSESSIONID"],
        ..RuleSpec::new("spring")
    },
    RuleSpec {
        body_patterns: &[r"__VIEWSTATE", r"__EVENTVALIDATION"],
        header_tokens: &["X-AspNet-Version", "X-AspNetMvc-Version"],
        cookie_tokens: &["ASP.NET_SessionId"],
        ..RuleSpec::new("aspnet")
    },
];

pub static BACKEND_FRAMEWORK_RULES: Lazy<Vec<SignatureRule>> =
    Lazy::new(|| compile_rules(BACKEND_FRAMEWORK_SPECS));

// --- Frontend Framework Signatures ---

// Frontend frameworks are a bare presence check: any body pattern hit adds
// the name to the result, without scoring or confidence.
const FRONTEND_SPECS: &[RuleSpec] = &[
    RuleSpec {
        body_patterns: &[r"react", r"_react", r"data-reactroot"],
        ..RuleSpec::new("react")
    },
    RuleSpec {
        body_patterns: &[r"vue\.js", r"data-v-", r"Vue\."],
        ..RuleSpec::new("vue")
    },
    RuleSpec {
        body_patterns: &[r"ng-app", r"ng-controller", r"angular"],
        ..RuleSpec::new("angular")
    },
    RuleSpec {
        body_patterns: &[r"jquery", r"\$\("],
        ..RuleSpec::new("jquery")
    },
    RuleSpec {
        body_patterns: &[r"bootstrap", r"btn-primary"],
        ..RuleSpec::new("bootstrap")
    },
    RuleSpec {
        body_patterns: &[r"tailwind"],
        ..RuleSpec::new("tailwind")
    },
];

pub static FRONTEND_RULES: Lazy<Vec<SignatureRule>> = Lazy::new(|| compile_rules(FRONTEND_SPECS));

// --- Database Error Signatures ---

// Error strings that leak into response bodies when a backend query fails.
const DATABASE_SPECS: &[RuleSpec] = &[
    RuleSpec {
        body_patterns: &[
            r"SQL syntax.*MySQL",
            r"Warning.*mysql_",
            r"MySQLSyntaxErrorException",
            r"valid MySQL result",
            r"check the manual that corresponds to your MySQL",
            r"mysql_fetch",
            r"mysql_num_rows",
        ],
        ..RuleSpec::new("mysql")
    },
    RuleSpec {
        body_patterns: &[
            r"PostgreSQL.*ERROR",
            r"Warning.*\Wpg_",
            r"valid PostgreSQL result",
            r"Npgsql\.",
            r"PG::SyntaxError",
            r"org.postgresql.util.PSQLException",
        ],
        ..RuleSpec::new("postgresql")
    },
    RuleSpec {
        body_patterns: &[
            r"Driver.*SQL Server",
            r"OLE DB.*SQL Server",
            r"(\W|\A)SQL Server.*Driver",
            r"Warning.*mssql_",
            r"Microsoft SQL Native Client error",
            r"ODBC SQL Server Driver",
            r"SQLServer JDBC Driver",
        ],
        ..RuleSpec::new("mssql")
    },
    RuleSpec {
        body_patterns: &[
            r"\bORA-[0-9][0-9][0-9][0-9]",
            r"Oracle error",
            r"Oracle.*Driver",
            r"Warning.*\Woci_",
            r"quoted string not properly terminated",
        ],
        ..RuleSpec::new("oracle")
    },
    RuleSpec {
        body_patterns: &[
            r"SQLite/JDBCDriver",
            r"SQLite.Exception",
            r"System.Data.SQLite.SQLiteException",
            r"Warning.*sqlite_",
            r"sqlite3.OperationalError",
        ],
        ..RuleSpec::new("sqlite")
    },
    RuleSpec {
        body_patterns: &[
            r"MongoError",
            r"mongodb://",
            r"TypeError: db\.\w+ is not a function",
        ],
        ..RuleSpec::new("mongodb")
    },
];

pub static DATABASE_RULES: Lazy<Vec<SignatureRule>> = Lazy::new(|| compile_rules(DATABASE_SPECS));

// --- WAF Signatures ---

const WAF_SPECS: &[RuleSpec] = &[
    RuleSpec {
        body_patterns: &[r"cloudflare", r"cf-ray"],
        header_tokens: &["CF-RAY", "cf-cache-status", "__cfduid"],
        cookie_tokens: &["__cfduid", "__cflb"],
        ..RuleSpec::new("cloudflare")
    },
    RuleSpec {
        header_tokens: &["X-Akamai-", "AkamaiGHost"],
        cookie_tokens: &["ak_bmsc"],
        ..RuleSpec::new("akamai")
    },
    RuleSpec {
        body_patterns: &[r"Access Denied.*AWS"],
        header_tokens: &["X-Amzn-", "X-AMZ-"],
        ..RuleSpec::new("aws_waf")
    },
    RuleSpec {
        body_patterns: &[r"Mod_Security", r"ModSecurity", r"NOYB"],
        ..RuleSpec::new("modsecurity")
    },
    RuleSpec {
        header_tokens: &["X-WA-Info"],
        cookie_tokens: &["TS", "F5"],
        ..RuleSpec::new("f5")
    },
    RuleSpec {
        header_tokens: &["X-Iinfo"],
        cookie_tokens: &["incap_ses", "visid_incap"],
        ..RuleSpec::new("imperva")
    },
];

pub static WAF_RULES: Lazy<Vec<SignatureRule>> = Lazy::new(|| compile_rules(WAF_SPECS));

// --- Server Software Patterns ---

/// A `Server` header pattern with a version capture group.
pub struct ServerPattern {
    pub name: &'static str,
    pub pattern: Regex,
}

const SERVER_SPECS: &[(&str, &str)] = &[
    ("nginx", r"nginx/([\d.]+)"),
    ("apache", r"Apache/([\d.]+)"),
    ("iis", r"Microsoft-IIS/([\d.]+)"),
    ("tomcat", r"Apache-Coyote/([\d.]+)"),
    ("lighttpd", r"lighttpd/([\d.]+)"),
];

pub static SERVER_PATTERNS: Lazy<Vec<ServerPattern>> = Lazy::new(|| {
    SERVER_SPECS
        .iter()
        .filter_map(|(name, pattern)| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => Some(ServerPattern { name, pattern: re }),
                Err(e) => {
                    warn!(server = name, pattern, error = %e, "Dropping unparsable server pattern.");
                    None
                }
            }
        })
        .collect()
});

/// The union of all per-rule CMS paths, declaration order preserved and
/// duplicates removed. The prober checks these once per analysis so each
/// CMS rule can count its own reachable paths as evidence.
pub fn cms_probe_paths() -> Vec<&'static str> {
    let mut paths = Vec::new();
    for rule in CMS_RULES.iter() {
        for path in rule.paths {
            if !paths.contains(path) {
                paths.push(*path);
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cms_table_preserves_declaration_order() {
        let names: Vec<&str> = CMS_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["wordpress", "joomla", "drupal", "magento", "shopify"]
        );
    }

    #[test]
    fn every_body_pattern_compiles() {
        // Nothing should be dropped by the unparsable-pattern fallback.
        for (specs, rules) in [
            (CMS_SPECS, &*CMS_RULES),
            (BACKEND_FRAMEWORK_SPECS, &*BACKEND_FRAMEWORK_RULES),
            (FRONTEND_SPECS, &*FRONTEND_RULES),
            (DATABASE_SPECS, &*DATABASE_RULES),
            (WAF_SPECS, &*WAF_RULES),
        ] {
            for (spec, rule) in specs.iter().zip(rules.iter()) {
                assert_eq!(
                    spec.body_patterns.len(),
                    rule.body_patterns.len(),
                    "pattern dropped for {}",
                    rule.name
                );
            }
        }
    }

    #[test]
    fn patterns_match_case_insensitively() {
        let wordpress = &CMS_RULES[0];
        assert!(wordpress.body_patterns[0].is_match("WP-CONTENT"));
        let nginx = &SERVER_PATTERNS[0];
        assert!(nginx.pattern.is_match("NGINX/1.18.0"));
    }

    #[test]
    fn cms_probe_paths_are_deduplicated_in_order() {
        let paths = cms_probe_paths();
        assert_eq!(paths[0], "/wp-login.php");
        assert_eq!(paths[1], "/wp-admin/");
        let unique: std::collections::HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn server_version_capture_extracts_version() {
        let nginx = &SERVER_PATTERNS[0];
        let caps = nginx.pattern.captures("nginx/1.18.0").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "1.18.0");
    }
}
