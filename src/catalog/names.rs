//! Database naming
//!
//! Every deployment lives in a server-side database named
//! `{tenant}-{timestamp}`. Tenants may themselves contain dashes, so parsing
//! splits on the last dash and only matches when the suffix is a decimal
//! timestamp.

/// Database name for a tenant's deployment at `timestamp`
pub fn database_name(tenant: &str, timestamp: u64) -> String {
    format!("{tenant}-{timestamp}")
}

/// Split a database name into `(tenant, timestamp)`
///
/// Returns `None` for names that are not timestamped deployments (including
/// the server's own databases).
pub fn parse_database_name(name: &str) -> Option<(&str, u64)> {
    let (tenant, suffix) = name.rsplit_once('-')?;
    if tenant.is_empty() {
        return None;
    }
    let timestamp = suffix.parse::<u64>().ok()?;
    Some((tenant, timestamp))
}

/// Filter a database listing down to one tenant's deployments
///
/// Returns `(timestamp, name)` pairs, newest first.
pub fn tenant_databases(databases: &[String], tenant: &str) -> Vec<(u64, String)> {
    let mut found: Vec<(u64, String)> = databases
        .iter()
        .filter_map(|name| match parse_database_name(name) {
            Some((t, ts)) if t == tenant => Some((ts, name.clone())),
            _ => None,
        })
        .collect();
    found.sort_by(|a, b| b.0.cmp(&a.0));
    found
}
