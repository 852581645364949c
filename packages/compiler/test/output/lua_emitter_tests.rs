/**
 * Lua Emitter Tests
 *
 * Complete chunks produced for small templates, and the generator's own
 * consistency checks
 */

#[path = "../util/mod.rs"]
mod utils;

#[cfg(test)]
mod tests {
    use super::utils::compiler_with_components;
    use lua_markup_compiler::output::LuaCodeGenerator;
    use lua_markup_compiler::{compile, CodeGenerator, CompileOptions, Compiler, ParsedExpression};

    /// Chunk produced with default options
    fn chunk(declarations: &str, build: &str) -> String {
        format!(
            "return function()\nlocal self = {{}}\n{}\n\
             function self:setParameters(p)\nself.parameters = p\nend\n\
             function self:build(__builder0)\n{}\nend\nreturn self\nend\n",
            declarations, build
        )
    }

    mod chunks {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn should_wrap_build_calls_in_constructor() {
            assert_eq!(
                compile("<p>@name</p>").unwrap(),
                "return function()\n\
                 local self = {}\n\
                 \n\
                 function self:setParameters(p)\n\
                 self.parameters = p\n\
                 end\n\
                 function self:build(__builder0)\n\
                 __builder0.OpenElement(0, \"p\")\n\
                 __builder0.AddContent(1, name)\n\
                 __builder0.CloseElement()\n\
                 \n\
                 end\n\
                 return self\n\
                 end\n"
            );
        }

        #[test]
        fn should_honour_options() {
            let options = CompileOptions {
                builder_prefix: "b".to_string(),
                emit_parameter_setter: false,
                ..CompileOptions::default()
            };
            assert_eq!(
                Compiler::new(options).compile("<br>").unwrap(),
                "return function()\nlocal self = {}\n\nfunction self:build(b0)\n\
                 b0.OpenElement(0, \"br\")\nb0.CloseElement()\n\nend\nreturn self\nend\n"
            );
        }

        #[test]
        fn should_emit_declarations_before_build() {
            let template =
                "@code local function item(x) return @<li>@x</li> end end<ul>@item(1)</ul>";
            assert_eq!(
                compile(template).unwrap(),
                chunk(
                    " local function item(x) return \n\
                     function(__builder0)\n\
                     __builder0.OpenElement(0, \"li\")\n\
                     __builder0.AddContent(1, x)\n\
                     __builder0.CloseElement()\n\
                     end\n \
                     end\n",
                    "__builder0.OpenElement(0, \"ul\")\n\
                     __builder0.AddContent(1, item(1))\n\
                     __builder0.CloseElement()\n"
                )
            );
        }
    }

    mod builder_calls {
        use super::*;
        use pretty_assertions::assert_eq;

        fn build(template: &str) -> String {
            let lua = compile(template).unwrap();
            let start = lua.find("function self:build(__builder0)\n").unwrap();
            let body = &lua[start + "function self:build(__builder0)\n".len()..];
            body[..body.len() - "\nend\nreturn self\nend\n".len()].to_string()
        }

        #[test]
        fn should_escape_markup_text() {
            assert_eq!(
                build("<p>say \"hi\"\n</p>"),
                "__builder0.OpenElement(0, \"p\")\n\
                 __builder0.AddMarkupContent(1, \"say \\\"hi\\\"\\n\")\n\
                 __builder0.CloseElement()\n"
            );
        }

        #[test]
        fn should_concatenate_attribute_segments() {
            assert_eq!(
                build(r#"<a href="/u/@id/edit"></a>"#),
                "__builder0.OpenElement(0, \"a\")\n\
                 __builder0.AddAttribute(1, \"href\", \"/u/\" .. (id) .. \"/edit\")\n\
                 __builder0.CloseElement()\n"
            );
        }

        #[test]
        fn should_tell_presence_from_empty_attribute() {
            assert_eq!(
                build(r#"<input disabled value="">"#),
                "__builder0.OpenElement(0, \"input\")\n\
                 __builder0.AddAttribute(1, \"disabled\")\n\
                 __builder0.AddAttribute(2, \"value\", \"\")\n\
                 __builder0.CloseElement()\n"
            );
        }

        #[test]
        fn should_open_components_by_type() {
            let lua = compiler_with_components()
                .compile(r#"<Counter Start="5" />"#)
                .unwrap();
            assert_eq!(
                lua,
                chunk(
                    "",
                    "__builder0.OpenComponent(0, \"Components.Counter\")\n\
                     __builder0.AddAttribute(1, \"Start\", 5)\n\
                     __builder0.CloseComponent()\n"
                )
            );
        }

        #[test]
        fn should_scope_regions_with_inner_builder() {
            assert_eq!(
                build("<ul>@for i = 1, 2 do <li>@i</li> end</ul>"),
                "__builder0.OpenElement(0, \"ul\")\n\
                 for i = 1, 2 do \n\
                 __builder0.OpenRegion(1)\n\
                 do\n\
                 local __builder1 = __builder0\n\
                 __builder1.OpenElement(0, \"li\")\n\
                 __builder1.AddContent(1, i)\n\
                 __builder1.CloseElement()\n\
                 end\n\
                 __builder0.CloseRegion()\n \
                 end\n\
                 __builder0.CloseElement()\n"
            );
        }

        #[test]
        fn should_pass_markup_closure_as_argument() {
            assert_eq!(
                build("<ul>@render(@<li>a</li>)</ul>"),
                "__builder0.OpenElement(0, \"ul\")\n\
                 __builder0.AddContent(1, render(function(__builder1)\n\
                 __builder1.OpenElement(0, \"li\")\n\
                 __builder1.AddMarkupContent(1, \"a\")\n\
                 __builder1.CloseElement()\n\
                 end))\n\
                 __builder0.CloseElement()\n"
            );
        }

        #[test]
        fn should_end_statement_closure_with_newline() {
            assert_eq!(
                build("@local f = wrap(@<b>x</b>)"),
                "local f = wrap(\n\
                 function(__builder1)\n\
                 __builder1.OpenElement(0, \"b\")\n\
                 __builder1.AddMarkupContent(1, \"x\")\n\
                 __builder1.CloseElement()\n\
                 end\n\
                 )\n"
            );
        }
    }

    mod generator_faults {
        use super::*;
        use pretty_assertions::assert_eq;

        fn generator() -> LuaCodeGenerator {
            LuaCodeGenerator::new(&CompileOptions::default())
        }

        #[test]
        fn should_refuse_to_finish_inside_code_block() {
            let mut generator = generator();
            generator.begin_code_block().unwrap();
            assert!(generator.finish().unwrap_err().is_internal());
        }

        #[test]
        fn should_reject_unbalanced_code_blocks() {
            let mut generator = generator();
            assert!(generator.end_code_block().unwrap_err().is_internal());
            generator.begin_code_block().unwrap();
            assert!(generator.begin_code_block().unwrap_err().is_internal());
        }

        #[test]
        fn should_reject_literals_in_content_mode() {
            let mut generator = generator();
            assert!(generator.write_string_literal("x").unwrap_err().is_internal());
        }

        #[test]
        fn should_reject_closure_end_without_begin() {
            let mut generator = generator();
            assert!(generator.end_markup_closure(0).unwrap_err().is_internal());
        }

        #[test]
        fn should_close_content_level_closure_with_newline() {
            let mut generator = generator();
            let expr = ParsedExpression::code("x");
            generator.write_content(0, 0, &expr).unwrap();
            generator.begin_markup_closure(0).unwrap();
            generator.end_markup_closure(0).unwrap();
            generator.write_raw("-- after").unwrap();
            let lua = generator.finish().unwrap();
            assert!(lua.contains("__builder0.AddContent(0, x)\nfunction(__builder1)\nend\n-- after"));
        }
    }
}
