//! 프리로드 모델.
//!
//! 프리로드 작업과, 호스트에 삽입되는 `<link>` 힌트를 정의한다.

use serde::{Deserialize, Serialize};

/// 프리로드 대상 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadKind {
    Image,
    Script,
    Style,
    Font,
    Dns,
    Connect,
    Module,
}

/// 프리로드 우선순위
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadPriority {
    Low,
    Medium,
    High,
}

/// 단일 프리로드 작업
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadTask {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: PreloadKind,
    pub priority: PreloadPriority,
}

impl PreloadTask {
    pub fn new(url: impl Into<String>, kind: PreloadKind, priority: PreloadPriority) -> Self {
        Self {
            url: url.into(),
            kind,
            priority,
        }
    }
}

/// `<link rel>` 값
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkRel {
    Preload,
    Prefetch,
    DnsPrefetch,
    Preconnect,
    Modulepreload,
}

impl LinkRel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkRel::Preload => "preload",
            LinkRel::Prefetch => "prefetch",
            LinkRel::DnsPrefetch => "dns-prefetch",
            LinkRel::Preconnect => "preconnect",
            LinkRel::Modulepreload => "modulepreload",
        }
    }
}

/// 호스트에 삽입할 `<link>` 요소 기술
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkHint {
    pub rel: LinkRel,
    pub href: String,
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub as_: Option<&'static str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossorigin: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetchpriority: Option<&'static str>,
}

impl LinkHint {
    /// 작업 종류/우선순위로부터 링크 힌트 구성
    ///
    /// 낮은 우선순위 스크립트(다음 라우트 번들)는 `prefetch`로 내려간다.
    pub fn for_task(task: &PreloadTask) -> Self {
        let mut hint = LinkHint {
            rel: LinkRel::Preload,
            href: task.url.clone(),
            as_: None,
            mime_type: None,
            crossorigin: None,
            fetchpriority: match task.priority {
                PreloadPriority::High => Some("high"),
                PreloadPriority::Low => Some("low"),
                PreloadPriority::Medium => None,
            },
        };

        match task.kind {
            PreloadKind::Image => hint.as_ = Some("image"),
            PreloadKind::Script if task.priority == PreloadPriority::Low => {
                hint.rel = LinkRel::Prefetch;
                hint.as_ = Some("script");
            }
            PreloadKind::Script => hint.as_ = Some("script"),
            PreloadKind::Style => hint.as_ = Some("style"),
            PreloadKind::Font => {
                hint.as_ = Some("font");
                hint.mime_type = font_mime_type(&task.url);
                // 폰트 프리로드는 CORS 모드가 필수
                hint.crossorigin = Some("anonymous");
            }
            PreloadKind::Dns => {
                hint.rel = LinkRel::DnsPrefetch;
                hint.fetchpriority = None;
            }
            PreloadKind::Connect => {
                hint.rel = LinkRel::Preconnect;
                hint.crossorigin = Some("anonymous");
                hint.fetchpriority = None;
            }
            PreloadKind::Module => hint.rel = LinkRel::Modulepreload,
        }

        hint
    }
}

fn font_mime_type(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "woff2" => Some("font/woff2"),
        "woff" => Some("font/woff"),
        "ttf" => Some("font/ttf"),
        "otf" => Some("font/otf"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_hint_is_crossorigin_with_mime() {
        let task = PreloadTask::new(
            "/fonts/inter.woff2?v=3",
            PreloadKind::Font,
            PreloadPriority::High,
        );
        let hint = LinkHint::for_task(&task);
        assert_eq!(hint.rel, LinkRel::Preload);
        assert_eq!(hint.as_, Some("font"));
        assert_eq!(hint.mime_type, Some("font/woff2"));
        assert_eq!(hint.crossorigin, Some("anonymous"));
    }

    #[test]
    fn low_priority_script_becomes_prefetch() {
        let task = PreloadTask::new("/static/js/blog.chunk.js", PreloadKind::Script, PreloadPriority::Low);
        assert_eq!(LinkHint::for_task(&task).rel, LinkRel::Prefetch);
    }

    #[test]
    fn dns_and_connect_map_to_resource_hints() {
        let dns = PreloadTask::new("https://fonts.gstatic.com", PreloadKind::Dns, PreloadPriority::Medium);
        let connect = PreloadTask::new("https://api.example.com", PreloadKind::Connect, PreloadPriority::High);
        assert_eq!(LinkHint::for_task(&dns).rel.as_str(), "dns-prefetch");
        let hint = LinkHint::for_task(&connect);
        assert_eq!(hint.rel.as_str(), "preconnect");
        assert!(hint.fetchpriority.is_none());
    }
}
