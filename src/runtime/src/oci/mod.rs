//! OCI layout handling for Zarf packages.
//!
//! A decompressed Zarf package keeps all of its images in one OCI layout.
//! This module loads that layout's index, names its images, and splits it
//! into per-image layouts that a scanner can consume independently.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────────┐
//! │  images/  (combined layout)  │        │  trivy-image-XXXX/ (per image)│
//! │  ├── oci-layout              │  copy  │  ├── oci-layout              │
//! │  ├── index.json  (N entries) │ ─────► │  ├── index.json  (1 entry)   │
//! │  └── blobs/                  │        │  └── blobs/                  │
//! │      └── sha256/<hex>...     │        │      └── sha256/<hex>...     │
//! └──────────────────────────────┘        └──────────────────────────────┘
//! ```

mod index;
mod isolate;
mod name;

pub use index::{
    index_path, load_index, ImageIndex, ManifestDescriptor, BLOBS_DIR, INDEX_FILE,
    OCI_LAYOUT_FILE,
};
pub use isolate::{ContentIsolator, Isolate, IsolatedLayout};
pub use name::{resolve_name, BASE_NAME_ANNOTATION, REF_NAME_ANNOTATION};
