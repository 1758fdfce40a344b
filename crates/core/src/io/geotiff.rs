//! Single-band GeoTIFF reading
//!
//! Landsat surface reflectance products ship one GeoTIFF per band. Each
//! file is decoded into a `Raster<f64>` with no-data cells set to NaN,
//! georeferenced from ModelPixelScale + ModelTiepoint tags.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray64Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: Tag = Tag::Unknown(33550);
const MODEL_TIEPOINT: Tag = Tag::Unknown(33922);
const GDAL_NODATA: Tag = Tag::Unknown(42113);

/// Read the first band of a GeoTIFF file.
///
/// Cells equal to `nodata` (or to the file's GDAL_NODATA tag when `nodata`
/// is `None`) become NaN.
pub fn read_band_geotiff<P: AsRef<Path>>(path: P, nodata: Option<f64>) -> Result<Raster<f64>> {
    let file = File::open(path.as_ref())?;
    decode_band(BufReader::new(file), nodata)
}

/// Same as [`read_band_geotiff`], from an in-memory buffer.
pub fn read_band_geotiff_from_buffer(data: &[u8], nodata: Option<f64>) -> Result<Raster<f64>> {
    decode_band(Cursor::new(data), nodata)
}

fn decode_band<R: Read + Seek>(reader: R, nodata: Option<f64>) -> Result<Raster<f64>> {
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let nodata = nodata.or_else(|| {
        decoder
            .get_tag_ascii_string(GDAL_NODATA)
            .ok()
            .and_then(|s| s.trim_end_matches('\0').trim().parse::<f64>().ok())
    });

    let values: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        _ => {
            return Err(Error::UnsupportedDataType(
                "only 8/16/32-bit integer and 32/64-bit float bands are supported".into(),
            ))
        }
    };

    if values.len() != rows * cols {
        // Multi-sample (RGB-style) files decode to more values than cells
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(values, rows, cols)?;
    raster.set_nodata(nodata);
    let mut raster = raster.to_f64();

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// Encode a band as a 64-bit float GeoTIFF. NaN cells are written as NaN
/// and flagged through the GDAL_NODATA tag.
pub fn write_band_geotiff_to_buffer(raster: &Raster<f64>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_band(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_band<W: Write + Seek>(raster: &Raster<f64>, writer: W) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = raster.shape();
    let data: Vec<f64> = raster.data().iter().copied().collect();

    let mut image = encoder.new_image::<Gray64Float>(cols as u32, rows as u32)?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image.encoder().write_tag(MODEL_PIXEL_SCALE, &scale[..])?;
    image.encoder().write_tag(MODEL_TIEPOINT, &tiepoint[..])?;
    image.encoder().write_tag(GDAL_NODATA, "nan")?;

    image.write_data(&data)?;
    Ok(())
}
