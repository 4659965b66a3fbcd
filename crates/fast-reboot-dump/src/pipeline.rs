//! One complete dump run
//!
//! ```text
//! ASIC_DB ──► Topology ──► FdbSnapshot ──► fdb.json
//!                              │
//! APPL_DB ──► NeighborSnapshot ◄┘ ──► arp.json ──► Announcer
//!        └──► default routes ──────► default_routes.json
//! ```
//!
//! Each database connection is scoped to its phase and closed before that
//! phase's artifacts are written.

use crate::announce::{AnnounceSummary, Announcer};
use crate::config::DumpConfig;
use crate::dump::{ensure_target_dir, write_artifact, DumpRecord};
use crate::error::Result;
use crate::fdb::FdbSnapshot;
use crate::interrupt::Interrupt;
use crate::neighbor::NeighborSnapshot;
use crate::route::load_default_routes;
use crate::store::{Connector, Namespace};
use crate::topology::Topology;
use std::path::Path;
use tracing::{debug, info, instrument};

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub fdb_entries: usize,
    pub neighbors: usize,
    pub default_routes: usize,
    /// `None` when announcements were disabled
    pub announce: Option<AnnounceSummary>,
}

/// Runs the dump into `target_dir`, then announces the kept neighbors.
///
/// `announcer` is only used when `announce.enabled` is set in `config`.
/// `interrupt` is checked before every artifact write and every announcement.
///
/// # NIST Controls
/// - CP-10: System Recovery - Forwarding state captured for fast reboot
/// - SI-11: Error Handling - First fatal error aborts the run
#[instrument(skip_all, fields(target = %target_dir.display()))]
pub async fn run<C>(
    connector: &C,
    config: &DumpConfig,
    target_dir: &Path,
    announcer: Option<&Announcer<'_>>,
    interrupt: &Interrupt,
) -> Result<DumpSummary>
where
    C: Connector + ?Sized,
{
    ensure_target_dir(target_dir)?;

    let fdb = {
        let mut asic_db = connector.connect(Namespace::AsicDb).await?;
        let topology = Topology::load(&mut asic_db).await?;
        FdbSnapshot::build(&mut asic_db, &topology, config.database.scan_count).await?
    };
    interrupt.check()?;
    write_artifact(target_dir, &config.output.fdb_file, &fdb.records())?;

    let (neighbors, routes) = {
        let mut appl_db = connector.connect(Namespace::ApplDb).await?;
        let neighbors = NeighborSnapshot::build(&mut appl_db, &fdb).await?;
        let routes = load_default_routes(&mut appl_db).await?;
        (neighbors, routes)
    };
    interrupt.check()?;
    write_artifact(target_dir, &config.output.arp_file, neighbors.records())?;
    let route_records: Vec<DumpRecord> = routes.iter().map(|route| route.to_record()).collect();
    interrupt.check()?;
    write_artifact(target_dir, &config.output.routes_file, &route_records)?;

    let announce = match announcer {
        Some(announcer) if config.announce.enabled => {
            Some(announcer.announce(neighbors.neighbors(), &fdb, interrupt)?)
        }
        _ => {
            debug!("Announcements disabled");
            None
        }
    };

    let summary = DumpSummary {
        fdb_entries: fdb.len(),
        neighbors: neighbors.len(),
        default_routes: routes.len(),
        announce,
    };
    info!(
        fdb = summary.fdb_entries,
        neighbors = summary.neighbors,
        routes = summary.default_routes,
        "Dump complete"
    );
    Ok(summary)
}
