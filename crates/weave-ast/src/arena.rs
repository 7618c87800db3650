use bumpalo::collections::Vec as BumpVec;

/// The single monotonic arena every AST node and copied string lives in.
///
/// Re-exported so downstream crates (the parser, tests) never need a direct
/// `bumpalo` dependency of their own — they go through `weave_ast::Arena`.
pub use bumpalo::Bump as Arena;

/// Copies a string slice into the arena, decoupling the AST from the
/// lifetime of the original source buffer.
pub fn alloc_str<'a>(arena: &'a Arena, s: &str) -> &'a str {
    arena.alloc_str(s)
}

/// Collects an iterator into an arena-backed slice.
pub fn alloc_slice<'a, T, I>(arena: &'a Arena, items: I) -> &'a [T]
where
    I: IntoIterator<Item = T>,
{
    let mut v = BumpVec::new_in(arena);
    v.extend(items);
    v.into_bump_slice()
}
