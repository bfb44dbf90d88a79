/// NullProgramCompiler - compiles the "null" program language
///
/// A null program is plain text. Lines starting with `#` are reflection
/// directives, everything else is ignored (it becomes the bytecode as-is):
///
/// ```text
/// #block    <name> <set> <slot> <size>
/// #param    <name> <type> <block> <offset> [<array_size> <stride>]
/// #texture  <name> <set> <slot> [1d|2d|3d|cube]
/// #rwtexture <name> <set> <slot> [1d|2d|3d]
/// #buffer   <name> <set> <slot> [structured|byte|rw-structured|rw-byte]
/// #sampler  <name> <set> <slot>
/// ```
///
/// `<type>` is one of `float`..`float4`, `int`..`int4`, `uint`..`uint4`,
/// `mat3`, `mat4`, `bool`. A `#param` must follow the `#block` it lives in.
/// Unknown directives and malformed lines fail the compilation.

use lumen_render_core::lumen::device::{CompiledProgram, GpuProgramCompiler};
use lumen_render_core::lumen::program::{
    GpuParamDataDesc, GpuParamDataType, GpuParamDesc, GpuParamObjectType, GpuProgramDesc,
};
use lumen_render_core::engine_debug;

/// Language name accepted by `NullProgramCompiler`
pub const NULL_LANGUAGE: &str = "null";

/// Reflection-directive compiler
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgramCompiler;

impl NullProgramCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Parse the directives of `source` into a stage descriptor
    ///
    /// Errors carry the 1-based line number.
    pub fn reflect(source: &str) -> std::result::Result<GpuParamDesc, String> {
        let mut desc = GpuParamDesc::new();
        for (index, line) in source.lines().enumerate() {
            let line = line.trim();
            let Some(directive) = line.strip_prefix('#') else { continue };
            let tokens: Vec<&str> = directive.split_whitespace().collect();
            desc = parse_directive(desc, &tokens)
                .map_err(|message| format!("line {}: {}", index + 1, message))?;
        }
        Ok(desc)
    }
}

fn parse_u32(token: Option<&&str>, what: &str) -> std::result::Result<u32, String> {
    let token = token.ok_or_else(|| format!("missing {}", what))?;
    token.parse().map_err(|_| format!("invalid {} '{}'", what, token))
}

fn parse_name<'a>(token: Option<&&'a str>) -> std::result::Result<&'a str, String> {
    token.copied().ok_or_else(|| "missing name".to_string())
}

fn parse_data_type(token: &str) -> Option<GpuParamDataType> {
    let data_type = match token {
        "float" => GpuParamDataType::Float1,
        "float2" => GpuParamDataType::Float2,
        "float3" => GpuParamDataType::Float3,
        "float4" => GpuParamDataType::Float4,
        "int" => GpuParamDataType::Int1,
        "int2" => GpuParamDataType::Int2,
        "int3" => GpuParamDataType::Int3,
        "int4" => GpuParamDataType::Int4,
        "uint" => GpuParamDataType::UInt1,
        "uint2" => GpuParamDataType::UInt2,
        "uint3" => GpuParamDataType::UInt3,
        "uint4" => GpuParamDataType::UInt4,
        "mat3" => GpuParamDataType::Matrix3x3,
        "mat4" => GpuParamDataType::Matrix4x4,
        "bool" => GpuParamDataType::Bool,
        _ => return None,
    };
    Some(data_type)
}

fn parse_object_type(directive: &str, variant: Option<&str>) -> std::result::Result<GpuParamObjectType, String> {
    let object_type = match (directive, variant) {
        ("texture", None | Some("2d")) => GpuParamObjectType::Texture2D,
        ("texture", Some("1d")) => GpuParamObjectType::Texture1D,
        ("texture", Some("3d")) => GpuParamObjectType::Texture3D,
        ("texture", Some("cube")) => GpuParamObjectType::TextureCube,
        ("rwtexture", None | Some("2d")) => GpuParamObjectType::RwTexture2D,
        ("rwtexture", Some("1d")) => GpuParamObjectType::RwTexture1D,
        ("rwtexture", Some("3d")) => GpuParamObjectType::RwTexture3D,
        ("buffer", None | Some("structured")) => GpuParamObjectType::StructuredBuffer,
        ("buffer", Some("byte")) => GpuParamObjectType::ByteBuffer,
        ("buffer", Some("rw-structured")) => GpuParamObjectType::RwStructuredBuffer,
        ("buffer", Some("rw-byte")) => GpuParamObjectType::RwByteBuffer,
        ("sampler", None) => GpuParamObjectType::Sampler,
        (_, Some(variant)) => return Err(format!("invalid {} variant '{}'", directive, variant)),
        (_, None) => return Err(format!("unknown directive '#{}'", directive)),
    };
    Ok(object_type)
}

fn parse_directive(desc: GpuParamDesc, tokens: &[&str]) -> std::result::Result<GpuParamDesc, String> {
    let Some((&directive, args)) = tokens.split_first() else {
        return Err("empty directive".to_string());
    };

    match directive {
        "block" => {
            if args.len() != 4 {
                return Err("expected #block <name> <set> <slot> <size>".to_string());
            }
            let name = parse_name(args.first())?;
            let set = parse_u32(args.get(1), "set")?;
            let slot = parse_u32(args.get(2), "slot")?;
            let size = parse_u32(args.get(3), "size")?;
            Ok(desc.add_param_block(name, set, slot, size))
        }
        "param" => {
            if args.len() != 4 && args.len() != 6 {
                return Err("expected #param <name> <type> <block> <offset> [<array_size> <stride>]".to_string());
            }
            let name = parse_name(args.first())?;
            let data_type = parse_data_type(args[1])
                .ok_or_else(|| format!("unknown type '{}'", args[1]))?;
            let block = desc.param_blocks.get(args[2])
                .ok_or_else(|| format!("param '{}' in undeclared block '{}'", name, args[2]))?;
            let offset = parse_u32(args.get(3), "offset")?;
            let end = offset as u64 + data_type.size_bytes() as u64;
            if end > block.block_size as u64 {
                return Err(format!("param '{}' overflows block '{}'", name, block.name));
            }
            let mut param = GpuParamDataDesc::new(name, data_type, block.set, block.slot, offset);
            if args.len() == 6 {
                let array_size = parse_u32(args.get(4), "array size")?;
                let stride = parse_u32(args.get(5), "stride")?;
                param = param.with_array(array_size, stride);
                if offset as u64 + param.byte_span() > block.block_size as u64 {
                    return Err(format!("param '{}' overflows block '{}'", name, block.name));
                }
            }
            Ok(desc.add_param(param))
        }
        "texture" | "rwtexture" | "buffer" | "sampler" => {
            if args.len() != 3 && args.len() != 4 {
                return Err(format!("expected #{} <name> <set> <slot> [<variant>]", directive));
            }
            let name = parse_name(args.first())?;
            let set = parse_u32(args.get(1), "set")?;
            let slot = parse_u32(args.get(2), "slot")?;
            let object_type = parse_object_type(directive, args.get(3).copied())?;
            Ok(desc.add_object(name, object_type, set, slot))
        }
        _ => Err(format!("unknown directive '#{}'", directive)),
    }
}

impl GpuProgramCompiler for NullProgramCompiler {
    fn compile(&self, desc: &GpuProgramDesc) -> CompiledProgram {
        match Self::reflect(&desc.source) {
            Ok(param_desc) => {
                engine_debug!("lumen::null", "Compiled '{}' ({} bytes)", desc.name, desc.source.len());
                CompiledProgram::compiled(desc.source.as_bytes().to_vec(), param_desc)
            }
            Err(message) => CompiledProgram::failed(format!("{}: {}", desc.name, message)),
        }
    }

    fn is_language_supported(&self, language: &str) -> bool {
        language == NULL_LANGUAGE
    }
}

#[cfg(test)]
#[path = "null_compiler_tests.rs"]
mod tests;
