//! The scale-to-height transcode operation.

use std::path::Path;
use tracing::info;

use vproc_models::TranscodeSpec;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Transcode `input` to `output`, scaled to the spec's target height with
/// aspect ratio preserved.
///
/// The input file is never mutated. Fails fast with
/// [`MediaError::SourceUnreadable`] when the input is missing or not a
/// regular file rather than waiting on the encoder.
///
/// Resolves exactly once: `Ok(())` after the output file is finalized and
/// closed, or an error carrying the encoder's diagnostic output.
pub async fn transcode_to_height(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    spec: &TranscodeSpec,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    match tokio::fs::metadata(input).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(MediaError::SourceUnreadable(input.to_path_buf())),
    }

    info!(
        "Transcoding {} -> {} ({}p)",
        input.display(),
        output.display(),
        spec.target_height
    );

    let cmd = FfmpegCommand::new(input, output).video_filter(spec.scale_filter());

    FfmpegRunner::new().run(&cmd).await?;

    info!("Transcode finished: {}", output.display());
    Ok(())
}
