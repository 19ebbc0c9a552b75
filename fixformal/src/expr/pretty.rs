//! RcDoc-based pretty-printer with termcolor annotations for `Expr`.
//!
//! Role
//! - Convert an `Expr` into an annotated document suitable for width-aware rendering.
//! - Provide colored output for terminals (TTY-aware) and plain strings for logs/tests.
//!
//! Bound variables are printed with their binder names (made unique when they
//! shadow an enclosing binder). Free variables are printed through an optional
//! resolver, usually backed by a local context, and fall back to `_fvar.N`.

use std::io::{self, Write};

use pretty::{FmtWrite, RcDoc, RenderAnnotated};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{expr::BinderInfo, expr::Expr, level::Level, name::Name, variable::FVarId};

/// Styles used to annotate parts of the pretty-printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Punct, // colons, arrows, `=>`
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Keyword, // fun, ∀
    Ident,   // bound and free variables
    Const,   // global constants
    Type,    // sorts
    Hole,    // metavariables
}

impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Punct => {
                s.set_dimmed(true);
            }
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Keyword => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Style::Ident => {
                s.set_fg(Some(Color::Green)).set_bold(true);
            }
            Style::Const => {
                s.set_fg(Some(Color::Yellow));
            }
            Style::Type => {
                s.set_fg(Some(Color::Magenta));
            }
            Style::Hole => {
                s.set_fg(Some(Color::Red)).set_italic(true);
            }
        }
        s
    }
}

fn styled(style: Style, s: impl Into<String>) -> RcDoc<'static, Style> {
    RcDoc::as_string(s.into()).annotate(style)
}

fn punct(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Punct, s)
}

fn kw(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Keyword, s)
}

#[inline]
fn lparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string("(").annotate(Style::Paren(depth))
}

#[inline]
fn rparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string(")").annotate(Style::Paren(depth))
}

/// Printing precedence; larger binds tighter.
fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::Lam { .. } => 1,
        Expr::Pi { .. } => 2,
        Expr::App(..) => 3,
        Expr::Sort(l) if !l.is_zero() => 3,
        _ => 255,
    }
}

/// Naming environment threaded through document construction.
struct Printer<'a> {
    fvar_name: Option<&'a dyn Fn(FVarId) -> Option<Name>>,
    binders: Vec<String>,
}

impl Printer<'_> {
    fn fresh_binder(&self, name: &Name) -> String {
        let base = if name.is_anonymous() {
            "x".to_string()
        } else {
            name.to_string()
        };
        if !self.binders.contains(&base) {
            return base;
        }
        (1..)
            .map(|i| format!("{}_{}", base, i))
            .find(|cand| !self.binders.contains(cand))
            .unwrap_or(base)
    }

    fn sort_doc(level: &Level) -> RcDoc<'static, Style> {
        match level {
            Level::Zero => styled(Style::Type, "Prop"),
            Level::Succ(inner) if inner.is_zero() => styled(Style::Type, "Type"),
            Level::Succ(inner) if matches!(**inner, Level::Param(_) | Level::MVar(_)) => {
                styled(Style::Type, format!("Type {}", inner))
            }
            Level::Succ(inner) => styled(Style::Type, format!("Type ({})", inner)),
            _ => styled(Style::Type, format!("Sort {}", level)),
        }
    }

    fn parenthesized(&mut self, e: &Expr, min_prec: u8, depth: u8) -> RcDoc<'static, Style> {
        if precedence(e) < min_prec {
            lparen(depth)
                .append(self.doc(e, depth + 1))
                .append(rparen(depth))
                .group()
        } else {
            self.doc(e, depth)
        }
    }

    fn binder_group(
        &mut self,
        name: &str,
        info: BinderInfo,
        ty: &Expr,
        depth: u8,
    ) -> RcDoc<'static, Style> {
        let (open, close) = match info {
            BinderInfo::Default => ("(", ")"),
            BinderInfo::Implicit => ("{", "}"),
            BinderInfo::InstImplicit => ("[", "]"),
        };
        styled(Style::Paren(depth), open)
            .append(styled(Style::Ident, name.to_string()))
            .append(punct(" : "))
            .append(self.doc(ty, depth + 1))
            .append(styled(Style::Paren(depth), close))
    }

    fn doc(&mut self, e: &Expr, depth: u8) -> RcDoc<'static, Style> {
        match e {
            Expr::BVar(i) => {
                let idx = self.binders.len() as i64 - 1 - *i as i64;
                match usize::try_from(idx).ok().and_then(|k| self.binders.get(k)) {
                    Some(n) => styled(Style::Ident, n.clone()),
                    None => styled(Style::Hole, format!("#{}", i)),
                }
            }
            Expr::FVar(id) => {
                let name = self.fvar_name.and_then(|f| f(*id));
                match name {
                    Some(n) => styled(Style::Ident, n.to_string()),
                    None => styled(Style::Ident, id.to_string()),
                }
            }
            Expr::MVar(id) => styled(Style::Hole, id.to_string()),
            Expr::Sort(l) => Self::sort_doc(l),
            Expr::Const(n, _) => styled(Style::Const, n.to_string()),
            Expr::App(..) => {
                let head = e.get_app_fn();
                let mut doc = self.parenthesized(head, 3, depth);
                for arg in e.get_app_args() {
                    doc = doc
                        .append(RcDoc::line())
                        .append(self.parenthesized(&arg, 4, depth));
                }
                doc.group().nest(2)
            }
            Expr::Lam { .. } => {
                let mut doc = kw("fun");
                let mut cur = e;
                let pushed = self.binders.len();
                while let Expr::Lam {
                    name,
                    info,
                    ty,
                    body,
                } = cur
                {
                    let shown = self.fresh_binder(name);
                    doc = doc
                        .append(RcDoc::space())
                        .append(self.binder_group(&shown, *info, ty, depth));
                    self.binders.push(shown);
                    cur = body;
                }
                let body = self.doc(cur, depth);
                self.binders.truncate(pushed);
                doc.append(punct(" =>"))
                    .append(RcDoc::line())
                    .append(body)
                    .group()
                    .nest(2)
            }
            Expr::Pi {
                name,
                info,
                ty,
                body,
            } => {
                if info.is_default() && !body.has_loose_bvar(0) {
                    let dom = self.parenthesized(ty, 3, depth);
                    self.binders.push("_".to_string());
                    let cod = self.parenthesized(body, 2, depth);
                    self.binders.pop();
                    return dom
                        .append(punct(" →"))
                        .append(RcDoc::line())
                        .append(cod)
                        .group();
                }
                let mut doc = kw("∀");
                let shown = self.fresh_binder(name);
                doc = doc
                    .append(RcDoc::space())
                    .append(self.binder_group(&shown, *info, ty, depth));
                self.binders.push(shown);
                let inner = self.doc(body, depth);
                self.binders.pop();
                doc.append(punct(","))
                    .append(RcDoc::line())
                    .append(inner)
                    .group()
                    .nest(2)
            }
        }
    }
}

/// Build the document of `e`, resolving free variable names through `fvar_name`.
pub fn to_doc_with(
    e: &Expr,
    fvar_name: Option<&dyn Fn(FVarId) -> Option<Name>>,
) -> RcDoc<'static, Style> {
    let mut printer = Printer {
        fvar_name,
        binders: Vec::new(),
    };
    printer.doc(e, 0)
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

impl<'a, 'w, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'w, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

impl<'w, W: WriteColor + Write> pretty::Render for ColorWriter<'w, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

/// Render a document to a `termcolor::WriteColor` with width-aware layout.
fn render_to<W: WriteColor + Write>(
    doc: &RcDoc<'_, Style>,
    width: usize,
    out: &mut W,
) -> io::Result<()> {
    let mut cw = ColorWriter { out };
    doc.render_raw(width, &mut cw)
}

/// Format a document into a plain string without colors.
pub fn doc_to_string(doc: &RcDoc<'_, Style>, width: usize) -> String {
    let mut buf = String::new();
    let _ = doc.render_fmt(width, &mut buf);
    buf
}

/// Retrieve the width of the terminal, or 80 if it cannot be determined.
fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Pretty-printing conveniences for expressions.
pub trait PrettyExpr {
    /// Build an RcDoc representation of this expression with style annotations.
    fn pretty_doc(&self) -> RcDoc<'static, Style>;

    /// Render this expression with colors to any termcolor writer at the given width.
    fn pretty_render_to<W: WriteColor + Write>(&self, width: usize, out: &mut W) -> io::Result<()> {
        render_to(&self.pretty_doc(), width, out)
    }

    /// Print this expression to stdout with colors (TTY-aware), at auto-detected width.
    fn pretty_print(&self) -> io::Result<()> {
        let stdout = StandardStream::stdout(ColorChoice::Auto);
        let mut stdout = stdout.lock();
        render_to(&self.pretty_doc(), terminal_width(), &mut stdout)
    }

    /// Format this expression into a plain string (no colors) at the given width.
    fn pretty_string(&self, width: usize) -> String {
        doc_to_string(&self.pretty_doc(), width)
    }
}

impl PrettyExpr for Expr {
    fn pretty_doc(&self) -> RcDoc<'static, Style> {
        to_doc_with(self, None)
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut w = FmtWrite::new(f);
        self.pretty_doc().render_raw(80, &mut w)
    }
}
