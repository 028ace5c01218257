//! Viewer settings collected from the command line.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::{Arg, Command};

use crate::shapes::TessellationParams;

const DEFAULT_NEAR_PLANE: f32 = 0.1;
const DEFAULT_FAR_PLANE: f32 = 100.0;
const DEFAULT_EXPORT_PATH: &str = "frame.png";

#[derive(Clone, Debug)]
pub struct Settings {
    /// Scene file to load at startup and on reload.
    pub scene_path: PathBuf,
    /// Initial tessellation detail for all primitives.
    pub tessellation: TessellationParams,
    /// Near clip plane distance.
    pub near_plane: f32,
    /// Far clip plane distance.
    pub far_plane: f32,
    /// Where exported frames are written.
    pub export_path: PathBuf,
}

impl Settings {
    /// Parse settings from the process command line.
    pub fn from_args() -> Result<Self> {
        Self::from_iter(std::env::args())
    }

    fn from_iter<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let defaults = TessellationParams::default();

        let matches = Command::new("sceneview")
            .about("Interactive renderer for hierarchical scene files")
            .arg(
                Arg::new("scene")
                    .value_name("SCENE_FILE")
                    .help("Path to the JSON scene file to display")
                    .required(true),
            )
            .arg(
                Arg::new("param1")
                    .long("param1")
                    .value_name("N")
                    .help("Tessellation detail along each primitive's height")
                    .value_parser(clap::value_parser!(u32))
                    .default_value(defaults.param1.to_string()),
            )
            .arg(
                Arg::new("param2")
                    .long("param2")
                    .value_name("N")
                    .help("Tessellation detail around each primitive's axis")
                    .value_parser(clap::value_parser!(u32))
                    .default_value(defaults.param2.to_string()),
            )
            .arg(
                Arg::new("near")
                    .long("near")
                    .value_name("DISTANCE")
                    .help("Near clip plane distance")
                    .value_parser(clap::value_parser!(f32))
                    .default_value(DEFAULT_NEAR_PLANE.to_string()),
            )
            .arg(
                Arg::new("far")
                    .long("far")
                    .value_name("DISTANCE")
                    .help("Far clip plane distance")
                    .value_parser(clap::value_parser!(f32))
                    .default_value(DEFAULT_FAR_PLANE.to_string()),
            )
            .arg(
                Arg::new("export")
                    .long("export")
                    .value_name("FILE")
                    .help("Output path for exported frames")
                    .default_value(DEFAULT_EXPORT_PATH),
            )
            .try_get_matches_from(args)?;

        let near_plane = *matches.get_one::<f32>("near").unwrap();
        let far_plane = *matches.get_one::<f32>("far").unwrap();

        ensure!(near_plane > 0.0, "near plane must be positive");
        ensure!(
            far_plane > near_plane,
            "far plane ({far_plane}) must be beyond the near plane ({near_plane})"
        );

        Ok(Self {
            scene_path: PathBuf::from(matches.get_one::<String>("scene").unwrap()),
            tessellation: TessellationParams::new(
                *matches.get_one::<u32>("param1").unwrap(),
                *matches.get_one::<u32>("param2").unwrap(),
            )
            .clamped(),
            near_plane,
            far_plane,
            export_path: PathBuf::from(matches.get_one::<String>("export").unwrap()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_the_scene_is_given() {
        let settings = Settings::from_iter(["sceneview", "scenes/demo.json"]).unwrap();

        assert_eq!(settings.scene_path, PathBuf::from("scenes/demo.json"));
        assert_eq!(settings.tessellation, TessellationParams::default());
        assert_eq!(settings.near_plane, DEFAULT_NEAR_PLANE);
        assert_eq!(settings.far_plane, DEFAULT_FAR_PLANE);
        assert_eq!(settings.export_path, PathBuf::from(DEFAULT_EXPORT_PATH));
    }

    #[test]
    fn tessellation_arguments_are_clamped_to_valid_ranges() {
        let settings = Settings::from_iter([
            "sceneview",
            "demo.json",
            "--param1",
            "0",
            "--param2",
            "1",
        ])
        .unwrap();

        assert_eq!(settings.tessellation, TessellationParams::new(1, 3));
    }

    #[test]
    fn missing_scene_argument_is_an_error() {
        assert!(Settings::from_iter(["sceneview"]).is_err());
    }

    #[test]
    fn inverted_clip_planes_are_rejected() {
        let result = Settings::from_iter([
            "sceneview",
            "demo.json",
            "--near",
            "10.0",
            "--far",
            "1.0",
        ]);

        assert!(result.is_err());
    }
}
