//! Trivy Zarf CLI - scan the container images of a Zarf package with Trivy.

pub mod commands;
pub mod output;
