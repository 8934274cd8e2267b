//! Built-in build settings for the DAESA website's custom stylesheet and script bundle.

pub(crate) fn style_build_config() -> StyleBuildConfig {
    StyleBuildConfig {
        comment_policy: CommentPolicy::UnlessFlagged,
        dependencies_root: PathBuf::from("./WSU-UE---CSS/"),
        output_dir: PathBuf::from("./CSS/"),
        header_injection: FONT_IMPORT.to_owned(),
        section_header: SectionHeaderInsertion {
            match_before: Pattern::new(Regex::clone(&MEDIA_QUERY)),
            insert_text: MEDIA_QUERIES_BANNER.to_owned(),
            stop_after_first_match: true,
        },
        minified_file_suffix: ".min.css".to_owned(),
        minified_header_text: String::new(),
        source_entry: PathBuf::from("./CSS/oue-custom.less"),
    }
}

/// The order matters: each plugin assumes jQuery and the scripts before it have already run.
pub(crate) fn script_build_config() -> ScriptBuildConfig {
    ScriptBuildConfig {
        sources: SCRIPT_SOURCES.iter().map(PathBuf::from).collect(),
        comment_policy: CommentPolicy::LeadingUnflagged,
        output_file_name: "oue-build.js".to_owned(),
        output_dir: PathBuf::from("./JS/"),
        minified_file_suffix: ".min.js".to_owned(),
        header_rewrite: HeaderRewrite::FLAG_PRESERVED,
    }
}

const SCRIPT_SOURCES: [&str; 12] = [
    "./WSU-UE---JS/jQuery.oue-custom.js",
    "./WSU-UE---JS/jQuery.oue-animate.js",
    "./WSU-UE---JS/jQuery.cookieObjs.js",
    "./WSU-UE---JS/jQuery.forms.js",
    "../jQuery.AreYouSure/jquery.are-you-sure.js",
    "./WSU-UE---JS/jQuery.are-you-sure.js",
    "../qTip2/dist/jquery.qtip.min.js",
    "./WSU-UE---JS/jQuery.qTip.js",
    "./WSU-UE---JS/jQuery.css-data.js",
    "./WSU-UE---JS/jQuery.textResize.js",
    "./WSU-UE---JS/jQuery.masonry-custom.js",
    "./JS/oue-custom.js",
];

static MEDIA_QUERY: Lazy<Regex> = Lazy::new(|| Regex::new("^@media").unwrap());

const FONT_IMPORT: &str = concat!(
    "@import url('https://fonts.googleapis.com/css?family=",
    "Open+Sans:300,300i,400,400i,600,600i,700,700i",
    "|Roboto+Condensed:400,400i,700,700i",
    "|PT+Serif:400,400i,700,700i",
    "|Roboto+Mono:400,400i,700,700i",
    "&display=swap');\r\n",
);

const MEDIA_QUERIES_BANNER: &str = concat!(
    "/*! ================================================================================",
    "================\r\n",
    "*** Media queries section\r\n",
    "*** ================================================================================",
    "================\r\n",
    "*** SUMMARY: Media queries built from precompiled CSS written in the Less language\r\n",
    "***   extension of CSS, combining queries shared by every WSU DAESA website with those\r\n",
    "***   specific to the DAESA website.\r\n",
    "***\r\n",
    "*** DESCRIPTION: The documented Less sources for this section are maintained at:\r\n",
    "***     https://github.com/invokeImmediately/WSU-UE---CSS/\r\n",
    "***     https://github.com/invokeImmediately/provost.wsu.edu_daesa_esteemed/\r\n",
    "*** ================================================================================",
    "================\r\n",
    "**/",
);


use crate::config::ScriptBuildConfig;
use crate::config::StyleBuildConfig;
use crate::util::rewrite::CommentPolicy;
use crate::util::rewrite::HeaderRewrite;
use crate::util::rewrite::Pattern;
use crate::util::rewrite::SectionHeaderInsertion;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
