//! Turn one trigger into one reply with a generated image attached.
//!
//! The pipeline runs `Generate -> Encode -> Upload -> Publish`, each stage
//! gated on the one before. The first failure abandons the response; nothing
//! escapes to the caller, which moves on to the next event.

use image::{DynamicImage, codecs::jpeg::JpegEncoder};
use tracing::{debug, error, info, instrument};

use crate::base::{
    html,
    types::{EncodedImage, MediaRef, ParsedTrigger, ReplyParams, Status, StatusId},
};

use super::BotContext;

/// JPEG quality used for every upload.
const JPEG_QUALITY: u8 = 100;

const FILE_NAME: &str = "iasip.jpg";

// Types.

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generate,
    Encode,
    Upload,
    Publish,
}

/// The failure that abandoned a response.
#[derive(Debug, thiserror::Error)]
pub enum RespondError {
    #[error("failed to generate image: {0:#}")]
    Generate(anyhow::Error),
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to upload image: {0:#}")]
    Upload(anyhow::Error),
    #[error("failed to publish reply: {0:#}")]
    Publish(anyhow::Error),
}

impl RespondError {
    pub fn stage(&self) -> Stage {
        match self {
            RespondError::Generate(_) => Stage::Generate,
            RespondError::Encode(_) => Stage::Encode,
            RespondError::Upload(_) => Stage::Upload,
            RespondError::Publish(_) => Stage::Publish,
        }
    }
}

/// Terminal state of one response.
#[derive(Debug)]
pub enum ResponseOutcome {
    Published(StatusId),
    Abandoned(RespondError),
}

// Pipeline.

/// Respond to `status` with an image generated from `trigger`.
///
/// Always returns; failures are logged with the author and content of the
/// source status and reported as `ResponseOutcome::Abandoned`.
#[instrument(skip_all, fields(status = %status.id, author = %status.account.acct))]
pub async fn respond(trigger: &ParsedTrigger, status: &Status, ctx: &BotContext) -> ResponseOutcome {
    match respond_internal(trigger, status, ctx).await {
        Ok(reply_id) => {
            info!("Replied to {} with {}", status.id, reply_id);
            ResponseOutcome::Published(reply_id)
        }
        Err(err) => {
            error!(
                "Failed to respond to message by {} ({:?} stage):\n\n{}\n\nError: {}",
                status.account.acct,
                err.stage(),
                html::to_plain_text(&status.content),
                err
            );
            ResponseOutcome::Abandoned(err)
        }
    }
}

async fn respond_internal(trigger: &ParsedTrigger, status: &Status, ctx: &BotContext) -> Result<StatusId, RespondError> {
    // Generate the image on the blocking pool.

    let generator = ctx.generator.clone();
    let text = trigger.payload.clone();
    let image = tokio::task::spawn_blocking(move || generator.generate(&text))
        .await
        .map_err(|e| RespondError::Generate(e.into()))?
        .map_err(RespondError::Generate)?;

    // Encode it.

    let media = encode_jpeg(&image, &trigger.payload)?;

    debug!("Encoded {}x{} image into {} bytes", image.width(), image.height(), media.bytes.len());

    // Upload it.

    let media_ref = ctx.social.upload_media(media).await.map_err(RespondError::Upload)?;

    // Reply with it.

    let params = build_reply(status, media_ref, &ctx.spoiler_text);

    ctx.social.publish_reply(&params).await.map_err(RespondError::Publish)
}

// Helpers.

/// Encode `image` as a maximum quality JPEG, with `description` as alt text.
pub fn encode_jpeg(image: &DynamicImage, description: &str) -> Result<EncodedImage, RespondError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(&image.to_rgb8())?;

    Ok(EncodedImage {
        bytes,
        file_name: FILE_NAME.to_string(),
        mime_type: "image/jpeg",
        description: (!description.is_empty()).then(|| description.to_string()),
    })
}

/// Build the reply to `status`.
///
/// The reply always mirrors the source visibility, so a direct message is
/// never answered in public and vice versa.
pub fn build_reply(status: &Status, media_ref: MediaRef, spoiler_text: &str) -> ReplyParams {
    ReplyParams {
        in_reply_to: status.id.clone(),
        sensitive: true,
        spoiler_text: spoiler_text.to_string(),
        body: format!("@{}", status.account.acct),
        media: vec![media_ref],
        visibility: status.visibility,
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::types::{Account, Visibility};
    use image::{Rgba, RgbaImage};

    fn create_test_status(visibility: Visibility) -> Status {
        Status {
            id: StatusId("109".to_string()),
            content: "<p>@iasipbot the gang opens a bar</p>".to_string(),
            account: Account {
                id: "7".to_string(),
                username: "charlie".to_string(),
                acct: "charlie@paddys.pub".to_string(),
            },
            visibility,
            created_at: chrono::Utc::now(),
            url: None,
        }
    }

    #[test]
    fn test_build_reply_mirrors_visibility() {
        for visibility in [Visibility::Public, Visibility::Unlisted, Visibility::Private, Visibility::Direct] {
            let status = create_test_status(visibility);

            let reply = build_reply(&status, MediaRef("m1".to_string()), "bot-generated IASIP");

            assert_eq!(reply.visibility, visibility);
        }
    }

    #[test]
    fn test_build_reply_fields() {
        let status = create_test_status(Visibility::Public);

        let reply = build_reply(&status, MediaRef("m1".to_string()), "bot-generated IASIP");

        assert_eq!(reply.in_reply_to, StatusId("109".to_string()));
        assert!(reply.sensitive);
        assert_eq!(reply.spoiler_text, "bot-generated IASIP");
        assert_eq!(reply.body, "@charlie@paddys.pub");
        assert_eq!(reply.media, vec![MediaRef("m1".to_string())]);
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 9, Rgba([255, 255, 255, 128])));

        let media = encode_jpeg(&image, "the gang opens a bar").unwrap();

        assert_eq!(&media.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(media.mime_type, "image/jpeg");
        assert_eq!(media.file_name, "iasip.jpg");
        assert_eq!(media.description.as_deref(), Some("the gang opens a bar"));
    }

    #[test]
    fn test_encode_jpeg_without_description() {
        let image = DynamicImage::new_rgb8(4, 4);

        let media = encode_jpeg(&image, "").unwrap();

        assert_eq!(media.description, None);
    }

    #[test]
    fn test_error_stage() {
        assert_eq!(RespondError::Generate(anyhow::anyhow!("nope")).stage(), Stage::Generate);
        assert_eq!(RespondError::Upload(anyhow::anyhow!("nope")).stage(), Stage::Upload);
        assert_eq!(RespondError::Publish(anyhow::anyhow!("nope")).stage(), Stage::Publish);
    }
}
