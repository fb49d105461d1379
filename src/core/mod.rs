// ─── LauncherFetch Core ───
// Version graph resolution and concurrent artifact retrieval for a Minecraft
// launcher.
//
// Architecture:
//   core/
//     version/   : Catalog, version JSON, child-over-parent merge, resolver
//     maven/     : Coordinate parsing and path derivation
//     assets/    : Asset index fetch + object expansion
//     downloader/: Worker pool, resumable transport, verify + atomic install
//     planner    : Manifest → retrieval tasks
//     verify     : Offline installation check
//     fetcher    : One retrieval session end to end

pub mod assets;
pub mod config;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod maven;
pub mod planner;
pub mod platform;
pub mod verify;
pub mod version;
