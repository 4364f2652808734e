//! 客户端标识提取
//!
//! 访问记录里的 IP 和 User-Agent 只在没有 visitorId 时用于识别独立访客。
//! 连接来自可信代理（显式配置，或未配置时的私有地址）才采信转发头。

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::{HeaderMap, USER_AGENT};
use tracing::trace;

use crate::config::get_config;

/// 解析 `ip` 或 `ip:port`
fn parse_peer(addr: &str) -> Option<IpAddr> {
    addr.parse::<IpAddr>()
        .ok()
        .or_else(|| addr.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// 私有网段或回环地址
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            let head = v6.segments()[0];
            // fc00::/7 ULA，fe80::/10 link-local
            v6.is_loopback() || (head & 0xfe00) == 0xfc00 || (head & 0xffc0) == 0xfe80
        }
    }
}

/// 单个地址或 CIDR 网段是否包含 `ip`
pub fn proxy_entry_matches(entry: &str, ip: &IpAddr) -> bool {
    let Some((network, prefix)) = entry.split_once('/') else {
        return entry.parse::<IpAddr>().is_ok_and(|addr| addr == *ip);
    };
    let (Ok(network), Ok(prefix)) = (network.parse::<IpAddr>(), prefix.parse::<u32>()) else {
        return false;
    };

    match (network, ip) {
        (IpAddr::V4(net), IpAddr::V4(addr)) if prefix <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            net.to_bits() & mask == addr.to_bits() & mask
        }
        (IpAddr::V6(net), IpAddr::V6(addr)) if prefix <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            net.to_bits() & mask == addr.to_bits() & mask
        }
        _ => false,
    }
}

/// 根据连接地址和转发头决定客户端 IP
///
/// - 配置了 `trusted_proxies`：只有连接来自其中之一才采信转发头
/// - 未配置：连接来自私有地址时采信转发头
/// - 否则使用连接地址
pub fn resolve_client_ip(
    peer: Option<&str>,
    forwarded: Option<String>,
    trusted_proxies: &[String],
) -> Option<String> {
    let Some(peer) = peer else {
        return forwarded;
    };
    let Some(peer_ip) = parse_peer(peer) else {
        return Some(peer.to_string());
    };

    let trust_forwarded = if trusted_proxies.is_empty() {
        is_private_or_local(&peer_ip)
    } else {
        trusted_proxies
            .iter()
            .any(|entry| proxy_entry_matches(entry, &peer_ip))
    };

    if trust_forwarded && let Some(real_ip) = forwarded {
        trace!("Client IP from forwarded header via {}: {}", peer_ip, real_ip);
        return Some(real_ip);
    }
    Some(peer_ip.to_string())
}

/// 转发头中的原始客户端地址（X-Forwarded-For 第一项，其次 X-Real-IP）
pub fn forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());

    header("x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .or_else(|| header("x-real-ip"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// 从 HttpRequest 提取真实客户端 IP
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let config = get_config();
    let peer = req.peer_addr().map(|addr| addr.ip().to_string());
    resolve_client_ip(
        peer.as_deref(),
        forwarded_ip_from_headers(req.headers()),
        &config.api.trusted_proxies,
    )
}

pub fn extract_user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(String::from)
}
