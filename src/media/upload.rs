//! multipart 表单读取
//!
//! 文本字段原样收集，文件字段按扩展名白名单、魔术字节与大小限制校验后读入内存。

use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use std::fmt;

use super::local::extension_of;
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::utils::{MediaKind, validate_magic_bytes};

/// 文本字段上限
const MAX_TEXT_FIELD_SIZE: usize = 8 * 1024;
/// 魔术字节校验所需的最少字节数
const MAGIC_PREFIX_LEN: usize = 16;

#[derive(Debug)]
pub enum UploadError {
    TypeNotAllowed(String),
    ContentMismatch,
    SizeExceeded(usize),
    MultipleFiles,
    Malformed(String),
}

impl UploadError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            UploadError::TypeNotAllowed(_) | UploadError::ContentMismatch => {
                ErrorCode::FileTypeNotAllowed
            }
            UploadError::SizeExceeded(_) => ErrorCode::FileSizeExceeded,
            UploadError::MultipleFiles => ErrorCode::MultifileUploadNotAllowed,
            UploadError::Malformed(_) => ErrorCode::BadRequest,
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::TypeNotAllowed(name) => write!(f, "File type not allowed: {name}"),
            UploadError::ContentMismatch => {
                write!(f, "File content does not match its extension")
            }
            UploadError::SizeExceeded(max) => {
                write!(f, "File size exceeds the limit of {max} bytes")
            }
            UploadError::MultipleFiles => write!(f, "Only one file can be uploaded at a time"),
            UploadError::Malformed(msg) => write!(f, "Malformed multipart payload: {msg}"),
        }
    }
}

/// 某类媒体的上传限制
#[derive(Debug, Clone)]
pub struct MediaPolicy {
    pub kind: MediaKind,
    pub allowed_extensions: Vec<String>,
    pub max_size: usize,
}

impl MediaPolicy {
    pub fn for_kind(kind: MediaKind) -> Self {
        let media = &AppConfig::get().media;
        let (allowed, max_size) = match kind {
            MediaKind::Video => (&media.video_types, media.max_video_size),
            MediaKind::Image => (&media.image_types, media.max_image_size),
        };
        Self {
            kind,
            allowed_extensions: allowed
                .iter()
                .map(|t| t.trim_start_matches('.').to_lowercase())
                .collect(),
            max_size,
        }
    }

    fn check_extension(&self, file_name: &str) -> Result<String, UploadError> {
        extension_of(file_name)
            .filter(|ext| self.allowed_extensions.iter().any(|t| t == ext))
            .ok_or_else(|| UploadError::TypeNotAllowed(file_name.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub extension: String,
    pub data: Vec<u8>,
}

/// 解析后的表单
#[derive(Debug, Default)]
pub struct MediaForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MediaForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// 逐块累积文件内容并在途中校验
struct FileSink<'a> {
    policy: &'a MediaPolicy,
    extension: String,
    data: Vec<u8>,
    verified: bool,
}

impl<'a> FileSink<'a> {
    fn new(policy: &'a MediaPolicy, extension: String) -> Self {
        Self {
            policy,
            extension,
            data: Vec::new(),
            verified: false,
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        if self.data.len() + chunk.len() > self.policy.max_size {
            return Err(UploadError::SizeExceeded(self.policy.max_size));
        }
        self.data.extend_from_slice(chunk);
        if !self.verified && self.data.len() >= MAGIC_PREFIX_LEN {
            self.verify()?;
        }
        Ok(())
    }

    fn verify(&mut self) -> Result<(), UploadError> {
        if !validate_magic_bytes(&self.data, &self.extension) {
            return Err(UploadError::ContentMismatch);
        }
        self.verified = true;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, UploadError> {
        if !self.verified {
            self.verify()?;
        }
        Ok(self.data)
    }
}

/// 读取 multipart 表单，`file_field` 为唯一允许的文件字段
pub async fn read_media_form(
    mut payload: Multipart,
    file_field: &str,
    policy: &MediaPolicy,
) -> Result<MediaForm, UploadError> {
    let mut form = MediaForm::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| UploadError::Malformed(e.to_string()))?
    {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        let file_name = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string());

        if name == file_field {
            if form.file.is_some() {
                return Err(UploadError::MultipleFiles);
            }
            let file_name = file_name.unwrap_or_default();
            let extension = policy.check_extension(&file_name)?;

            let mut sink = FileSink::new(policy, extension.clone());
            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| UploadError::Malformed(e.to_string()))?;
                sink.push(&data)?;
            }
            form.file = Some(UploadedFile {
                file_name,
                extension,
                data: sink.finish()?,
            });
        } else if !name.is_empty() {
            let mut value = Vec::new();
            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| UploadError::Malformed(e.to_string()))?;
                if value.len() + data.len() > MAX_TEXT_FIELD_SIZE {
                    return Err(UploadError::Malformed(format!("Field '{name}' is too large")));
                }
                value.extend_from_slice(&data);
            }
            let value = String::from_utf8(value)
                .map_err(|_| UploadError::Malformed(format!("Field '{name}' is not UTF-8")))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
