//! Lua scripts implementing the three atomic lock operations.
//!
//! Every script receives the full key set as `KEYS` and runs atomically on
//! one Redis server, so a multi-key request is all-or-nothing per server.

/// Sets every key to `ARGV[1]` with a TTL of `ARGV[2]` ms iff none exists.
pub const ACQUIRE_SCRIPT: &str = r#"
    for _, key in ipairs(KEYS) do
        if redis.call('exists', key) == 1 then
            return 0
        end
    end
    for _, key in ipairs(KEYS) do
        redis.call('set', key, ARGV[1], 'PX', ARGV[2])
    end
    return 1
"#;

/// Deletes every key holding `ARGV[1]`; returns how many were deleted.
pub const RELEASE_SCRIPT: &str = r#"
    local deleted = 0
    for _, key in ipairs(KEYS) do
        if redis.call('get', key) == ARGV[1] then
            deleted = deleted + redis.call('del', key)
        end
    end
    return deleted
"#;

/// Resets every key to `ARGV[1]` with a TTL of `ARGV[2]` ms iff all hold it.
pub const EXTEND_SCRIPT: &str = r#"
    for _, key in ipairs(KEYS) do
        if redis.call('get', key) ~= ARGV[1] then
            return 0
        end
    end
    for _, key in ipairs(KEYS) do
        redis.call('set', key, ARGV[1], 'PX', ARGV[2])
    end
    return 1
"#;
