mod flow;
mod grouping;
