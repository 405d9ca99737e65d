//! Threaded test backend
//!
//! Binds only search-name and search-group. The name search walks its
//! percentage from 0 to 100 in steps of ten, pausing one poll interval per
//! step, so it is a convenient target for cancellation. Both searches
//! report the same two installed packages.

use pk_errors::{BackendError, Error};
use pk_types::{InfoKind, Role, StatusKind};
use tracing::debug;

use crate::capability::CapabilityTable;
use crate::request::Request;
use crate::transaction::TransactionContext;

pub const DESCRIPTION: &str = "Test Thread";
pub const AUTHOR: &str = "pkhost Contributors";

/// Packages every search reports, in emission order
pub const PACKAGES: [(&str, &str); 2] = [
    ("glib2;2.14.0;i386;fedora", "The GLib library"),
    ("gtk2;gtk2-2.11.6-6.fc8;i386;fedora", "GTK+ Libraries for GIMP"),
];

const STEP: u8 = 10;

#[must_use]
pub fn capabilities() -> CapabilityTable {
    CapabilityTable::builder(DESCRIPTION, AUTHOR)
        .initialize(|| {
            debug!(backend = DESCRIPTION, "initialize");
            Ok(())
        })
        .destroy(|| {
            debug!(backend = DESCRIPTION, "destroy");
            Ok(())
        })
        .cancel(|ctx| debug!(transaction = %ctx.id(), "cancelling"))
        .operation(Role::SearchGroup, |dispatch| dispatch.spawn(search_group))
        .operation(Role::SearchName, |dispatch| dispatch.spawn(search_name))
        .build()
}

fn search_group(ctx: &TransactionContext) -> Result<(), Error> {
    ctx.set_status(StatusKind::Query)?;
    emit_packages(ctx)?;
    ctx.finish()?;
    Ok(())
}

fn search_name(ctx: &TransactionContext) -> Result<(), Error> {
    let Request::SearchName { filters, search } = ctx.request() else {
        return Err(BackendError::invalid_argument(format!(
            "search-name worker started for {}",
            ctx.role()
        ))
        .into());
    };
    debug!(transaction = %ctx.id(), search, filters = %filters, "started task");
    ctx.set_status(StatusKind::Query)?;

    let mut percentage = 0;
    while percentage < 100 {
        if ctx.is_cancelled() {
            return stop_cancelled(ctx);
        }
        ctx.set_percentage(percentage)?;
        percentage += STEP;
        if ctx.pause(ctx.poll_interval()) {
            return stop_cancelled(ctx);
        }
    }
    if ctx.is_cancelled() {
        return stop_cancelled(ctx);
    }
    ctx.set_percentage(100)?;
    debug!(transaction = %ctx.id(), "exited task");

    emit_packages(ctx)?;
    ctx.finish()?;
    Ok(())
}

fn stop_cancelled(ctx: &TransactionContext) -> Result<(), Error> {
    debug!(transaction = %ctx.id(), "cancelled task");
    ctx.error_code(&BackendError::cancelled("The thread was stopped successfully"))?;
    ctx.finish()?;
    Ok(())
}

fn emit_packages(ctx: &TransactionContext) -> Result<(), Error> {
    for (package_id, summary) in PACKAGES {
        ctx.package(InfoKind::Installed, package_id, Some(summary))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_searches_bound() {
        let table = capabilities();
        let roles: Vec<Role> = table.roles().collect();
        assert_eq!(roles, vec![Role::SearchGroup, Role::SearchName]);
        assert!(table.supports_cancel());
        assert_eq!(table.description(), DESCRIPTION);
    }

    #[test]
    fn test_fixed_packages_parse() {
        for (package_id, _) in PACKAGES {
            assert!(pk_types::PackageId::parse(package_id).is_ok());
        }
    }
}
