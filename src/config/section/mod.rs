//! Configuration section definitions.
//!
//! Each module corresponds to a section in `brandkit.toml`:
//!
//! | Module    | TOML Section | Purpose                                  |
//! |-----------|--------------|------------------------------------------|
//! | `export`  | `[export]`   | Brand name, temp dir, job timeout        |
//! | `backend` | `[backend]`  | Render backend selection                 |
//! | `recolor` | `[recolor]`  | SVG recolor strategy                     |
//! | `raster`  | `[raster]`   | JPG quality, ICO size, JPG background    |
//! | `pdf`     | `[pdf]`      | PDF drawing mode and page size           |

mod backend;
mod export;
mod pdf;
mod raster;
mod recolor;

pub use backend::{BackendConfig, BackendKind};
pub use export::ExportSection;
pub use pdf::{PdfConfig, PdfMode};
pub use raster::RasterConfig;
pub use recolor::{RecolorConfig, RecolorStrategy};
