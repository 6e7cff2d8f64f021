//! `hreach template` command - print a CSV input template

use clap::ValueEnum;
use console::style;
use miette::Result;

use crate::cli::GlobalOpts;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TemplateKind {
    /// One row per hole
    #[default]
    Flat,
    /// One row per object with a JSON `holes` column
    Nested,
    /// Object declarations for the flat layout
    Objects,
}

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Which input table to generate
    #[arg(value_enum, default_value_t = TemplateKind::Flat)]
    pub kind: TemplateKind,
}

pub fn run(args: TemplateArgs, global: &GlobalOpts) -> Result<()> {
    // Output to stdout so it can be redirected to a file
    print!("{}", template(args.kind));

    if !global.quiet {
        let (flag, file) = match args.kind {
            TemplateKind::Flat => ("", "holes"),
            TemplateKind::Nested => (" nested", "objects"),
            TemplateKind::Objects => (" objects", "objects"),
        };
        eprintln!();
        eprintln!(
            "{} Template generated. Redirect to file: hreach template{} > {}.csv",
            style("→").blue(),
            flag,
            file
        );
    }
    Ok(())
}

/// CSV text of a template: header plus example rows
pub fn template(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Flat => concat!(
            "object_id,hole_id,length,radius,units\n",
            "BRACKET-01,H1,12.5,2.5,mm\n",
            "BRACKET-01,H2,60,1.5,mm\n",
            "PLATE-07,H3,3.2,0.125,in\n",
        ),
        TemplateKind::Nested => concat!(
            "uuid,units,holes\n",
            "BRACKET-01,mm,\"[{\"\"length\"\": 12.5, \"\"radius\"\": 2.5}, {\"\"length\"\": 60, \"\"radius\"\": 1.5}]\"\n",
            "PLATE-07,in,\"[{\"\"length\"\": 3.2, \"\"radius\"\": 0.125}]\"\n",
            "COVER-02,mm,[]\n",
        ),
        TemplateKind::Objects => concat!(
            "object_id,name\n",
            "BRACKET-01,Mounting bracket\n",
            "PLATE-07,Base plate\n",
            "COVER-02,Cover (no holes)\n",
        ),
    }
}
