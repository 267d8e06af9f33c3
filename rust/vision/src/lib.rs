// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan recognition
//!
//! Turns raster floorplans into labeled vector shapes:
//! 1. Layout regions are found and each is cropped and rescaled to a
//!    canonical pixels-per-meter
//! 2. Models run tile by tile; instances cut by a tile edge are dropped
//!    and the rest merged across tile overlaps
//! 3. Masks become polygons: traced contours for spaces, minimum rotated
//!    rectangles for icons, skeleton and Hough rectangles for walls
//! 4. Doors and windows are snapped into the walls they cross
//! 5. Shapes are mapped back to the source image frame
//!
//! # Usage
//!
//! ```rust,ignore
//! use floorplan_vision::{classical_registry, decode_image, FloorplanPredictor, ModelKind};
//!
//! let registry = classical_registry()?;
//! let image = decode_image(&bytes)?;
//! let walls = FloorplanPredictor::default()
//!     .predict_with(&registry, ModelKind::Walls, &image, &[], Some(50.0))?;
//! ```

pub mod background;
pub mod classical;
pub mod contour;
pub mod error;
pub mod floorplan;
pub mod geojson;
pub mod icons;
pub mod image_ops;
pub mod line_ops;
pub mod mask;
pub mod predictor;
pub mod roi;
pub mod skeleton;
pub mod spaces;
pub mod statistics;
pub mod svg;
pub mod tiled;
pub mod tiling;
pub mod types;
pub mod wall_detector;

pub use background::background_prediction;
pub use classical::classical_registry;
pub use error::{Result, VisionError};
pub use floorplan::{FloorplanConfig, FloorplanPredictor};
pub use geojson::{from_geojson, to_geojson, FeatureCollection};
pub use icons::{IconModelConfig, IconPredictor};
pub use image_ops::{decode_image, ScoreMap};
pub use mask::Mask;
pub use predictor::{ModelKind, ModelRegistry, ModelStore, Predictor};
pub use roi::{rois_from_prediction, BoxDetector, RoiConfig, RoiPredictor, ScoredBox};
pub use spaces::{SpaceConfig, SpacePredictor};
pub use statistics::{calculate_statistics, Statistics, DEFAULT_PIXELS_PER_METER};
pub use svg::to_svg;
pub use tiled::{Instance, InstanceModel, TiledConfig, TiledPredictor};
pub use tiling::{generate_tiles, tile_bounds, Tile};
pub use types::{BoundingBox, ClassLabel, Detection, Prediction, Roi};
pub use wall_detector::{extract_rectangles, RectangleConfig, SegmentationLabel, SegmentationModel, WallPredictor};
