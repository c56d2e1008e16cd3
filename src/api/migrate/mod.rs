//! Migration: consolidate pre-existing per-client content into the canonical
//! tree before link projection takes over.

pub(super) mod apply;
pub(super) mod scan;
