//! Turns XML events into a skin tree
//!
//! The builder is the whole loader state: header, finished displays, the
//! display being filled, the stack of open objects, include depth and the
//! directory of the file currently being read. Any error aborts the parse
//! and the partial tree is dropped with the builder.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use glcd_expr::{EvalPolicy, Function, TemplateString, Variable};
use glcd_render::object::InvalidValue;
use glcd_render::{
    Bar, ButtonObject, ColorSpec, FontDef, Geometry, ImageObject, Object, ObjectKind, Span, TextObject,
};
use glcd_xml::{Attributes, Parser, XmlHandler};

use crate::context::SkinContext;
use crate::display::Display;
use crate::error::{LoadError, SkinError};
use crate::skin::{SUPPORTED_VERSION, Skin};

type Result<T> = std::result::Result<T, LoadError>;

/// `<skin>` attributes
struct Header {
    version: String,
    name: String,
    enable: Option<Function>,
}

pub(crate) struct SkinBuilder {
    ctx: SkinContext,
    header: Option<Header>,
    displays: Vec<Display>,
    display: Option<Display>,
    /// Open drawable elements, innermost last
    open: Vec<Object>,
    /// Character data of the innermost text-bearing object
    text: String,
    include_depth: u32,
    max_include_depth: u32,
    /// Directory of the file being parsed; `<include>` paths start here
    dir: PathBuf,
}

impl SkinBuilder {
    pub(crate) fn new(ctx: SkinContext, max_include_depth: u32) -> Self {
        let dir = ctx.base_dir().to_path_buf();
        Self {
            ctx,
            header: None,
            displays: Vec::new(),
            display: None,
            open: Vec::new(),
            text: String::new(),
            include_depth: 0,
            max_include_depth,
            dir,
        }
    }

    pub(crate) fn host_parser<R>(&mut self, f: impl FnOnce(&Parser<'_>, &mut Self) -> R) -> R {
        let host = Rc::clone(&self.ctx.host);
        let parser = host.charset().map_or_else(Parser::new, Parser::with_charset);
        f(&parser, self)
    }

    pub(crate) fn finish(self) -> std::result::Result<Skin, SkinError> {
        let Some(header) = self.header else {
            return Err(SkinError::NoSkin);
        };
        Ok(Skin::new(header.version, header.name, header.enable, self.displays, self.ctx))
    }

    fn include(&mut self, attrs: &Attributes) -> Result<()> {
        let file = required(attrs, "include", "path")?;
        let path = self.dir.join(file);
        if self.include_depth >= self.max_include_depth {
            return Err(LoadError::IncludeDepth {
                path,
                limit: self.max_include_depth,
            });
        }
        tracing::debug!("Including {} at depth {}", path.display(), self.include_depth + 1);

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| self.dir.clone());
        let saved_dir = std::mem::replace(&mut self.dir, dir);
        self.include_depth += 1;
        let result = self.host_parser(|parser, builder| parser.parse_file(&path, builder));
        self.include_depth -= 1;
        self.dir = saved_dir;

        result.map_err(|err| LoadError::Include {
            path,
            source: Box::new(err.into()),
        })
    }

    fn skin(&mut self, attrs: &Attributes) -> Result<()> {
        if self.header.is_some() || self.include_depth > 0 {
            return Err(unexpected("skin", "after the skin header"));
        }
        let version = required(attrs, "skin", "version")?;
        if !version_supported(version) {
            return Err(LoadError::UnsupportedVersion {
                found: version.to_string(),
                supported: SUPPORTED_VERSION,
            });
        }
        let enable = attrs.get("enable").map(|e| Function::parse(e, &self.ctx)).transpose()?;
        self.header = Some(Header {
            version: version.to_string(),
            name: attrs.get("name").unwrap_or_default().to_string(),
            enable,
        });
        Ok(())
    }

    fn variable(&mut self, attrs: &Attributes) -> Result<()> {
        let id = required(attrs, "variable", "id")?;
        let value = required(attrs, "variable", "value")?;
        let policy = attrs.get("evaluate").map(EvalPolicy::from_str).transpose()?.unwrap_or_default();

        let mut variable = Variable::new(id, Function::parse(value, &self.ctx)?).with_policy(policy);
        if let Some(condition) = attrs.get("condition") {
            variable = variable.with_condition(Function::parse(condition, &self.ctx)?);
        }
        self.ctx.variables.push(variable);

        if let Some(default) = attrs.get("default") {
            let fallback = Variable::new(id, Function::parse(default, &self.ctx)?).with_policy(policy);
            self.ctx.variables.push(fallback);
        }
        Ok(())
    }

    fn font(&mut self, attrs: &Attributes) -> Result<()> {
        let id = required(attrs, "font", "id")?;
        let url = required(attrs, "font", "url")?;
        let mut font = FontDef::new(id, url.parse()?);
        if let Some(condition) = attrs.get("condition") {
            font = font.with_condition(Function::parse(condition, &self.ctx)?);
        }
        self.ctx.fonts.push(font);
        Ok(())
    }

    fn object(&self, tag: &str, attrs: &Attributes) -> Result<Object> {
        let ctx = &self.ctx;
        let expr = |name: &str| -> Result<Option<Function>> {
            Ok(attrs.get(name).map(|v| Function::parse(v, ctx)).transpose()?)
        };
        let expr_or = |name: &str, default: i64| -> Result<Function> {
            Ok(expr(name)?.unwrap_or(Function::number(default)))
        };
        let filled = flag_attr(tag, attrs, "filled")?.unwrap_or(false);

        let kind = match tag {
            "pixel" => ObjectKind::Pixel,
            "line" => ObjectKind::Line,
            "rectangle" => ObjectKind::Rectangle {
                filled,
                radius: expr_or("radius", 0)?,
            },
            "ellipse" => ObjectKind::Ellipse {
                filled,
                arc: expr_or("arc", 0)?,
            },
            "slope" => ObjectKind::Slope {
                arc: match expr("arc")? {
                    Some(arc) => arc,
                    None => expr_or("type", 0)?,
                },
            },
            "image" => {
                let mut image = ImageObject::new(TemplateString::parse(required(attrs, tag, "path")?, ctx)?);
                image.loop_mode = keyword_attr(tag, attrs, "loop")?.unwrap_or(image.loop_mode);
                image.scale = keyword_attr(tag, attrs, "scale")?.unwrap_or(image.scale);
                ObjectKind::Image(image)
            }
            "progress" | "scrollbar" => {
                let current = expr("current")?.ok_or_else(|| missing(tag, "current"))?;
                let total = expr("total")?.ok_or_else(|| missing(tag, "total"))?;
                let mut bar = Bar::new(current, total);
                bar.direction = keyword_attr(tag, attrs, "direction")?.unwrap_or_default();
                if tag == "progress" {
                    bar.peak = expr("peak")?;
                    ObjectKind::Progress(bar)
                } else {
                    ObjectKind::Scrollbar(bar)
                }
            }
            "text" | "scrolltext" => {
                let font = required(attrs, tag, "font")?;
                let mut text = if tag == "scrolltext" {
                    TextObject::scrolling(font, TemplateString::default())
                } else {
                    TextObject::new(font, TemplateString::default())
                };
                text.align = keyword_attr(tag, attrs, "align")?.unwrap_or_default();
                text.valign = keyword_attr(tag, attrs, "valign")?.unwrap_or_default();
                text.multiline = flag_attr(tag, attrs, "multiline")?.unwrap_or(false);
                text.scroll = keyword_attr(tag, attrs, "scrollmode")?.unwrap_or(text.scroll);
                text.scroll_speed = number_attr(tag, attrs, "scrollspeed")?.unwrap_or(text.scroll_speed);
                text.scroll_time = number_attr(tag, attrs, "scrolltime")?.unwrap_or(text.scroll_time);
                ObjectKind::Text(text)
            }
            "button" => {
                let mut button = ButtonObject::new(required(attrs, tag, "font")?, TemplateString::default());
                button.radius = expr_or("radius", 0)?;
                ObjectKind::Button(button)
            }
            "block" => ObjectKind::Block(Vec::new()),
            "list" => ObjectKind::list(Vec::new()),
            "item" => ObjectKind::Item {
                height: expr("height")?.ok_or_else(|| missing(tag, "height"))?,
            },
            _ => return Err(unexpected(tag, "in a display")),
        };

        let mut object = Object::new(kind);
        object.geometry = geometry(&expr)?;
        object.condition = expr("condition")?;
        if let Some(color) = attrs.get("color") {
            object.color = ColorSpec::parse(color).ok_or_else(|| invalid(tag, "color", color))?;
        }
        if let Some(bgcolor) = attrs.get("bgcolor") {
            object.bgcolor = ColorSpec::parse(bgcolor).ok_or_else(|| invalid(tag, "bgcolor", bgcolor))?;
        }
        Ok(object)
    }

    /// Attach a finished object to its container
    fn attach(&mut self, object: Object) -> Result<()> {
        let is_item = matches!(object.kind, ObjectKind::Item { .. });
        if let Some(parent) = self.open.last_mut() {
            let is_list = matches!(parent.kind, ObjectKind::List { .. });
            let Some(children) = parent.kind.children_mut() else {
                return Err(unexpected(object.kind.name(), "inside a non-container object"));
            };
            if is_item != (is_list && children.is_empty()) {
                return Err(if is_item {
                    unexpected("item", "outside the start of a list")
                } else {
                    LoadError::MissingItem
                });
            }
            children.push(object);
            return Ok(());
        }
        if is_item {
            return Err(unexpected("item", "outside a list"));
        }
        match self.display.as_mut() {
            Some(display) => {
                display.push(object);
                Ok(())
            }
            None => Err(unexpected(object.kind.name(), "outside a display")),
        }
    }

    fn close_object(&mut self) -> Result<()> {
        let Some(mut object) = self.open.pop() else {
            return Ok(());
        };
        let text = std::mem::take(&mut self.text);
        match &mut object.kind {
            ObjectKind::Text(t) => t.text = TemplateString::parse(text.trim(), &self.ctx)?,
            ObjectKind::Button(b) => b.text = TemplateString::parse(text.trim(), &self.ctx)?,
            ObjectKind::List { children, .. } if children.is_empty() => return Err(LoadError::MissingItem),
            _ => {}
        }
        self.attach(object)
    }
}

impl XmlHandler for SkinBuilder {
    type Error = LoadError;

    fn start_element(&mut self, tag: &str, attrs: &Attributes, _line: u32) -> Result<()> {
        match tag {
            "include" => self.include(attrs),
            "skin" => self.skin(attrs),
            _ if self.header.is_none() => Err(unexpected(tag, "before <skin>")),
            "variable" | "font" | "display" if self.display.is_some() => Err(unexpected(tag, "inside a display")),
            "variable" => self.variable(attrs),
            "font" => self.font(attrs),
            "display" => {
                let id = required(attrs, tag, "id")?;
                self.display = Some(Display::new(id));
                Ok(())
            }
            _ if self.display.is_none() => Err(unexpected(tag, "outside a display")),
            _ => {
                let object = self.object(tag, attrs)?;
                self.text.clear();
                self.open.push(object);
                Ok(())
            }
        }
    }

    fn end_element(&mut self, tag: &str, _line: u32) -> Result<()> {
        match tag {
            "include" | "skin" | "variable" | "font" => Ok(()),
            "display" => {
                if let Some(finished) = self.display.take() {
                    tracing::debug!("Display '{}' with {} objects", finished.id(), finished.objects().len());
                    self.displays.push(finished);
                }
                Ok(())
            }
            _ => self.close_object(),
        }
    }

    fn text(&mut self, text: &str, _line: u32) -> Result<()> {
        if let Some(object) = self.open.last() {
            if matches!(object.kind, ObjectKind::Text(_) | ObjectKind::Button(_)) {
                self.text.push_str(text);
            }
        }
        Ok(())
    }
}

/// `x1,y1,x2,y2`, or `x,y,width,height`
fn geometry(expr: &impl Fn(&str) -> Result<Option<Function>>) -> Result<Geometry> {
    let mut geometry = Geometry::default();
    if let Some(x1) = expr("x1")?.or(expr("x")?) {
        geometry.x1 = x1;
    }
    if let Some(y1) = expr("y1")?.or(expr("y")?) {
        geometry.y1 = y1;
    }
    if let Some(x2) = expr("x2")? {
        geometry.x2 = Span::End(x2);
    } else if let Some(width) = expr("width")? {
        geometry.x2 = Span::Length(width);
    }
    if let Some(y2) = expr("y2")? {
        geometry.y2 = Span::End(y2);
    } else if let Some(height) = expr("height")? {
        geometry.y2 = Span::Length(height);
    }
    Ok(geometry)
}

/// `major.minor` not newer than the supported version
fn version_supported(version: &str) -> bool {
    fn parts(v: &str) -> Option<(u32, u32)> {
        let (major, minor) = v.trim().split_once('.').unwrap_or((v.trim(), "0"));
        Some((major.parse().ok()?, minor.parse().ok()?))
    }
    match (parts(version), parts(SUPPORTED_VERSION)) {
        (Some(found), Some(supported)) => found <= supported,
        _ => false,
    }
}

fn required<'a>(attrs: &'a Attributes, tag: &str, name: &'static str) -> Result<&'a str> {
    attrs.get(name).ok_or_else(|| missing(tag, name))
}

fn keyword_attr<T: FromStr<Err = InvalidValue>>(tag: &str, attrs: &Attributes, name: &str) -> Result<Option<T>> {
    attrs
        .get(name)
        .map(|value| value.parse().map_err(|_| invalid(tag, name, value)))
        .transpose()
}

fn flag_attr(tag: &str, attrs: &Attributes, name: &str) -> Result<Option<bool>> {
    attrs
        .get(name)
        .map(|value| match value {
            "yes" | "true" | "1" => Ok(true),
            "no" | "false" | "0" => Ok(false),
            _ => Err(invalid(tag, name, value)),
        })
        .transpose()
}

fn number_attr<T: FromStr>(tag: &str, attrs: &Attributes, name: &str) -> Result<Option<T>> {
    attrs
        .get(name)
        .map(|value| value.trim().parse().map_err(|_| invalid(tag, name, value)))
        .transpose()
}

fn missing(tag: &str, name: &'static str) -> LoadError {
    LoadError::MissingAttribute {
        tag: tag.to_string(),
        name,
    }
}

fn invalid(tag: &str, name: &str, value: &str) -> LoadError {
    LoadError::InvalidAttribute {
        tag: tag.to_string(),
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn unexpected(tag: &str, context: &'static str) -> LoadError {
    LoadError::UnexpectedTag {
        tag: tag.to_string(),
        context,
    }
}
