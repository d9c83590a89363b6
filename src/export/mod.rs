//! Vector exporters.
//!
//! - [`eps`]: PostScript text with a fixed prolog
//! - [`pdf`]: one-page PDF, vector or raster
//!
//! Neither exporter fails outward: conversion errors are logged and a
//! marked fallback document is returned instead.

pub mod eps;
pub mod pdf;
