//! Single-band GeoTIFF encoding and decoding.
//!
//! Surfaces are stored as 64-bit float grayscale TIFFs. Georeferencing uses
//! the `ModelTransformationTag` (so positive row steps are representable) and
//! a minimal GeoKey directory: model type, raster type, the CRS citation and,
//! for `EPSG:` identifiers that fit, the projected CS code.

// External dependencies
use ndarray::Array2;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

// Internal dependencies
use crate::primitives::errors::DensityError;
use crate::raster::transform::{AffineTransform, Crs};

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GT_CITATION: u16 = 1026;
const PROJECTED_CS_TYPE: u16 = 3072;
const GEO_ASCII_PARAMS: u16 = 34737;
const MODEL_TYPE_PROJECTED: u16 = 1;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Decoded raster contents.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterData {
    /// Row-major values, shape (height, width).
    pub values: Array2<f64>,
    /// Pixel → coordinate map.
    pub transform: AffineTransform,
    /// CRS recorded in the GeoKey citation, if any.
    pub crs: Option<Crs>,
}

/// GeoKey directory for `crs`.
fn geo_keys(crs: &Crs, citation_len: usize) -> Vec<u16> {
    let mut entries: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED],
        [GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA],
        [GT_CITATION, GEO_ASCII_PARAMS, citation_len as u16, 0],
    ];
    if let Some(code) = crs.epsg().and_then(|c| u16::try_from(c).ok()) {
        entries.push([PROJECTED_CS_TYPE, 0, 1, code]);
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.iter().flatten());
    keys
}

/// Encode `values` as a GeoTIFF and write it to `path`.
///
/// The file is written to a sibling `.tmp` path first and renamed, so readers
/// never observe a half-written raster.
pub fn write_geotiff(
    path: &Path,
    values: &Array2<f64>,
    transform: &AffineTransform,
    crs: &Crs,
) -> Result<(), DensityError> {
    let (rows, cols) = values.dim();
    let width = u32::try_from(cols)
        .map_err(|_| DensityError::InvalidInput(format!("raster width {} too large", cols)))?;
    let height = u32::try_from(rows)
        .map_err(|_| DensityError::InvalidInput(format!("raster height {} too large", rows)))?;

    let citation = format!("{}|", crs);
    let keys = geo_keys(crs, citation.len());
    let model = transform.to_model_transformation();
    let data: Vec<f64> = values.iter().copied().collect();

    let mut cursor = Cursor::new(Vec::new());
    {
        let tiff_err = |e: tiff::TiffError| DensityError::from_tiff(path, e);
        let mut encoder = TiffEncoder::new(&mut cursor).map_err(tiff_err)?;
        let mut image = encoder
            .new_image::<colortype::Gray64Float>(width, height)
            .map_err(tiff_err)?;
        image
            .encoder()
            .write_tag(Tag::ModelTransformationTag, &model[..])
            .map_err(tiff_err)?;
        image
            .encoder()
            .write_tag(Tag::GeoKeyDirectoryTag, &keys[..])
            .map_err(tiff_err)?;
        image
            .encoder()
            .write_tag(Tag::GeoAsciiParamsTag, citation.as_str())
            .map_err(tiff_err)?;
        image.write_data(&data).map_err(tiff_err)?;
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| DensityError::RasterIo {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let tmp = temp_path(path);
    fs::write(&tmp, cursor.into_inner()).map_err(|source| DensityError::RasterIo {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| DensityError::RasterIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a GeoTIFF written by [`write_geotiff`] (or any single-band float TIFF
/// carrying a `ModelTransformationTag`).
pub fn read_geotiff(path: &Path) -> Result<RasterData, DensityError> {
    let bytes = fs::read(path).map_err(|source| DensityError::RasterIo {
        path: path.to_path_buf(),
        source,
    })?;
    let tiff_err = |e: tiff::TiffError| DensityError::from_tiff(path, e);
    let invalid = |reason: &str| DensityError::InvalidRaster {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut decoder = Decoder::new(Cursor::new(bytes)).map_err(tiff_err)?;
    let (width, height) = decoder.dimensions().map_err(tiff_err)?;

    let model = decoder
        .find_tag(Tag::ModelTransformationTag)
        .map_err(tiff_err)?
        .ok_or_else(|| invalid("missing ModelTransformationTag"))?
        .into_f64_vec()
        .map_err(tiff_err)?;
    let transform = AffineTransform::from_model_transformation(&model)
        .ok_or_else(|| invalid("ModelTransformationTag must hold 16 values"))?;

    let crs = match decoder.find_tag(Tag::GeoAsciiParamsTag).map_err(tiff_err)? {
        Some(value) => {
            let text = value.into_string().map_err(tiff_err)?;
            let id = text.trim_end_matches(['\0', '|']);
            (!id.is_empty()).then(|| Crs::new(id))
        }
        None => None,
    };

    let data = match decoder.read_image().map_err(tiff_err)? {
        DecodingResult::F64(v) => v,
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        _ => return Err(invalid("expected a 32- or 64-bit float band")),
    };

    let values = Array2::from_shape_vec((height as usize, width as usize), data)
        .map_err(|e| invalid(&format!("pixel data does not match dimensions: {}", e)))?;

    Ok(RasterData {
        values,
        transform,
        crs,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
