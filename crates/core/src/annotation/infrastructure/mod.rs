pub mod box_label_annotator;
pub mod font_resolver;
