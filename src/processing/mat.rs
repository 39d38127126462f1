//! Conversions between [`Frame`] and OpenCV `Mat`

use crate::error::{Error, Result};
use crate::types::Frame;

use opencv::core::{Mat, Scalar, CV_8U, CV_8UC1, CV_8UC3, CV_8UC4};
use opencv::prelude::*;

fn mat_type(channels: u32) -> Result<i32> {
    match channels {
        1 => Ok(CV_8UC1),
        3 => Ok(CV_8UC3),
        4 => Ok(CV_8UC4),
        n => Err(Error::Inference(format!("Unsupported channel count: {}", n))),
    }
}

/// Copy a frame into a newly allocated 8-bit `Mat`
pub fn frame_to_mat(frame: &Frame) -> Result<Mat> {
    if frame.data.len() != frame.expected_len() {
        return Err(Error::FrameGeometry {
            expected: format!("{} bytes", frame.expected_len()),
            actual: format!("{} bytes", frame.data.len()),
        });
    }

    let mut mat = Mat::new_rows_cols_with_default(
        frame.height as i32,
        frame.width as i32,
        mat_type(frame.channels)?,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(&frame.data);
    Ok(mat)
}

/// Copy an 8-bit `Mat` out into a packed frame
pub fn mat_to_frame(mat: &Mat) -> Result<Frame> {
    if mat.depth() != CV_8U {
        return Err(Error::Inference(format!(
            "Expected 8-bit pixels, got depth {}",
            mat.depth()
        )));
    }

    let owned;
    let mat = if mat.is_continuous() {
        mat
    } else {
        owned = mat.try_clone()?;
        &owned
    };

    Ok(Frame::from_data(
        mat.data_bytes()?.to_vec(),
        mat.cols() as u32,
        mat.rows() as u32,
        mat.channels() as u32,
    ))
}
