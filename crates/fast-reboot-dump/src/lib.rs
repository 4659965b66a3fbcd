//! Fast-reboot state dump for SONiC
//!
//! Before a fast reboot, captures the forwarding state programmed in the ASIC
//! (learned FDB entries, the neighbors reachable through them and the default
//! routes) into JSON artifacts that are replayed into APPL_DB after the
//! restart. The kept neighbors are then sent one ARP request or Neighbor
//! Solicitation each, so peers refresh their caches for the switch.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//!
//! | Control | Description | Implementation |
//! |---------|-------------|----------------|
//! | AU-3 | Content of Audit Records | Structured logging per phase |
//! | CM-6 | Configuration Settings | Optional TOML configuration |
//! | CP-10 | System Recovery | State snapshot for fast reboot |
//! | SC-5 | DoS Protection | Non-unicast MACs filtered, one frame per neighbor |
//! | SI-10 | Input Validation | Store records validated into typed records |
//! | SI-11 | Error Handling | Structured error types, mapped to exit codes |
//!
//! # Artifacts
//!
//! | File | Content |
//! |------|---------|
//! | `fdb.json` | `FDB_TABLE:Vlan<N>:<mac>` entries with `type` and `port` |
//! | `arp.json` | `NEIGH_TABLE:<ifname>:<ip>` entries with their raw fields |
//! | `default_routes.json` | `ROUTE_TABLE:0.0.0.0/0` and `ROUTE_TABLE:::/0` |

pub mod announce;
pub mod config;
pub mod dump;
pub mod error;
pub mod fdb;
pub mod interrupt;
pub mod neighbor;
pub mod pipeline;
pub mod records;
pub mod route;
pub mod store;
pub mod tables;
pub mod topology;
pub mod types;

pub use announce::{AnnounceSummary, Announcer, FrameSocket, HostInterfaces, LinkLayer};
pub use config::{DumpConfig, DEFAULT_CONFIG_PATH};
pub use dump::DumpRecord;
pub use error::{DumpError, Result};
pub use fdb::FdbSnapshot;
pub use interrupt::Interrupt;
pub use neighbor::NeighborSnapshot;
pub use pipeline::{run, DumpSummary};
pub use store::{Connector, MemoryConnector, MemoryStore, Namespace, RedisConnector, StateStore};
pub use topology::Topology;
pub use types::{FdbEntry, FdbType, MacAddress, NeighborEntry, ObjectId, VlanId, VlanMac};
